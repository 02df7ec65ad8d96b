//! Worker thread loop.

use super::pool::{PoolState, Shared};
use super::task::Task;
use std::sync::Arc;
use std::time::Instant;

/// Index of a worker within its pool.
pub type WorkerId = usize;

pub(crate) struct Worker {
    pub id: WorkerId,
    shared: Arc<Shared>,
}

impl Worker {
    pub fn new(id: WorkerId, shared: Arc<Shared>) -> Self {
        Self { id, shared }
    }

    // main loop
    pub fn run(self) {
        tracing::trace!(worker = self.id, "worker started");

        while let Some(task) = self.next_task() {
            self.execute_task(task);
        }

        tracing::trace!(worker = self.id, "worker exiting");
    }

    /// Block until there is a task to run or the pool tells this worker to
    /// stop. Returns `None` exactly once, after deregistering the worker.
    /// The last worker out marks the pool `Stopped`.
    fn next_task(&self) -> Option<Task> {
        let mut queue = self.shared.queue.lock();

        loop {
            // re-check after every wake, spurious or not
            while queue.tasks.is_empty() && queue.state == PoolState::Running {
                self.shared.available.wait(&mut queue);
            }

            let exit = match queue.state {
                PoolState::Running => false,
                PoolState::SoftShutdown => queue.tasks.is_empty(),
                PoolState::HardShutdown | PoolState::Stopped => true,
            };

            if exit {
                queue.live_workers -= 1;
                if queue.live_workers == 0 {
                    queue.state = PoolState::Stopped;
                }
                return None;
            }

            if let Some(task) = queue.tasks.pop() {
                return Some(task);
            }
        }
    }

    // runs outside the pool lock
    fn execute_task(&self, task: Task) {
        let tid = task.id;
        tracing::trace!(
            worker = self.id,
            task = %tid,
            priority = %task.priority,
            queued_us = task.spawn_time.elapsed().as_micros() as u64,
            "running task"
        );

        let start = Instant::now();
        let result = self.shared.panic_handler.execute(|| task.execute());
        let duration_ns = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);

        self.shared.metrics.record_task_execution(duration_ns);

        if let Err(report) = result {
            self.shared.metrics.record_task_panic();
            tracing::debug!(worker = self.id, task = %tid, message = %report.message, "task panicked");
        }
    }
}
