//! Pool metrics: task counters plus an execution-latency histogram.

use hdrhistogram::Histogram;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// One hour in nanoseconds; longer executions are clamped.
const MAX_TRACKED_NS: u64 = 3_600_000_000_000;

/// Counters shared by a pool and its workers.
#[derive(Debug)]
pub struct Metrics {
    tasks_submitted: AtomicU64,
    tasks_rejected: AtomicU64,
    tasks_executed: AtomicU64,
    tasks_panicked: AtomicU64,
    tasks_discarded: AtomicU64,

    busy_time_ns: AtomicU64,

    // None if the histogram could not be created; counters still work
    latency_histogram: Option<RwLock<Histogram<u64>>>,

    start_time: Instant,
}

impl Metrics {
    /// Zeroed counters, with uptime measured from now.
    pub fn new() -> Self {
        let latency_histogram = Histogram::new_with_max(MAX_TRACKED_NS, 3)
            .ok()
            .map(RwLock::new);

        Self {
            tasks_submitted: AtomicU64::new(0),
            tasks_rejected: AtomicU64::new(0),
            tasks_executed: AtomicU64::new(0),
            tasks_panicked: AtomicU64::new(0),
            tasks_discarded: AtomicU64::new(0),
            busy_time_ns: AtomicU64::new(0),
            latency_histogram,
            start_time: Instant::now(),
        }
    }

    /// Count an accepted submission.
    pub fn record_submitted(&self) {
        self.tasks_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a refused submission.
    pub fn record_rejected(&self) {
        self.tasks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Count tasks dropped by an immediate shutdown.
    pub fn record_discarded(&self, count: usize) {
        self.tasks_discarded.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record a finished task (panicked or not) and how long it ran.
    pub fn record_task_execution(&self, duration_ns: u64) {
        self.tasks_executed.fetch_add(1, Ordering::Relaxed);
        self.busy_time_ns.fetch_add(duration_ns, Ordering::Relaxed);

        if let Some(histogram) = &self.latency_histogram {
            if let Some(mut hist) = histogram.try_write() {
                hist.saturating_record(duration_ns.min(MAX_TRACKED_NS));
            }
        }
    }

    /// Count a task that panicked.
    pub fn record_task_panic(&self) {
        self.tasks_panicked.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every counter and the latency percentiles.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut snapshot = MetricsSnapshot {
            timestamp: Instant::now(),
            uptime: self.start_time.elapsed(),
            tasks_submitted: self.tasks_submitted.load(Ordering::Relaxed),
            tasks_rejected: self.tasks_rejected.load(Ordering::Relaxed),
            tasks_executed: self.tasks_executed.load(Ordering::Relaxed),
            tasks_panicked: self.tasks_panicked.load(Ordering::Relaxed),
            tasks_discarded: self.tasks_discarded.load(Ordering::Relaxed),
            busy_time_ns: self.busy_time_ns.load(Ordering::Relaxed),
            avg_latency_ns: 0,
            p50_latency_ns: 0,
            p95_latency_ns: 0,
            p99_latency_ns: 0,
            max_latency_ns: 0,
        };

        if let Some(histogram) = &self.latency_histogram {
            let hist = histogram.read();
            if hist.len() > 0 {
                snapshot.avg_latency_ns = hist.mean() as u64;
                snapshot.p50_latency_ns = hist.value_at_quantile(0.50);
                snapshot.p95_latency_ns = hist.value_at_quantile(0.95);
                snapshot.p99_latency_ns = hist.value_at_quantile(0.99);
                snapshot.max_latency_ns = hist.max();
            }
        }

        snapshot
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    /// When the snapshot was taken.
    pub timestamp: Instant,
    /// Time since the pool started.
    pub uptime: Duration,
    /// Accepted submissions.
    pub tasks_submitted: u64,
    /// Refused submissions.
    pub tasks_rejected: u64,
    /// Tasks that ran to the end or panicked.
    pub tasks_executed: u64,
    /// Tasks that panicked.
    pub tasks_panicked: u64,
    /// Queued tasks dropped by an immediate shutdown.
    pub tasks_discarded: u64,
    /// Total time spent running tasks, across all workers.
    pub busy_time_ns: u64,
    /// Mean task execution time.
    pub avg_latency_ns: u64,
    /// Median task execution time.
    pub p50_latency_ns: u64,
    /// 95th percentile execution time.
    pub p95_latency_ns: u64,
    /// 99th percentile execution time.
    pub p99_latency_ns: u64,
    /// Longest task execution time.
    pub max_latency_ns: u64,
}

impl MetricsSnapshot {
    /// Executed tasks per second of uptime.
    pub fn tasks_per_second(&self) -> f64 {
        let seconds = self.uptime.as_secs_f64();
        if seconds == 0.0 {
            return 0.0;
        }
        self.tasks_executed as f64 / seconds
    }

    /// Submitted tasks that have neither run nor been discarded yet.
    pub fn outstanding(&self) -> u64 {
        self.tasks_submitted
            .saturating_sub(self.tasks_executed)
            .saturating_sub(self.tasks_discarded)
    }
}
