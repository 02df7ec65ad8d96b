//! The thread pool: shared queue, worker threads and shutdown.

use super::future::{self, TaskFuture};
use super::panic_handler::PanicHandler;
use super::task::{Priority, Task};
use super::worker::{Worker, WorkerId};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::scheduler::heap::Heap;
use crate::telemetry::{Metrics, MetricsSnapshot};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub(crate) type TaskOrder = fn(&Task, &Task) -> bool;
pub(crate) type TaskHeap = Heap<Task, TaskOrder>;

/// How [`ThreadPool::shutdown`] treats work that is still queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Discard queued tasks. Workers finish the task they are running, then exit.
    Immediate,
    /// Keep draining the queue until it is empty, then exit.
    Graceful,
}

/// Lifecycle of a pool. Leaves `Running` at most once and never returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Accepting submissions.
    Running,
    /// Graceful shutdown in progress: the queue is being drained.
    SoftShutdown,
    /// Immediate shutdown in progress: only running tasks finish.
    HardShutdown,
    /// Every worker has exited.
    Stopped,
}

impl ShutdownMode {
    fn target_state(self) -> PoolState {
        match self {
            ShutdownMode::Immediate => PoolState::HardShutdown,
            ShutdownMode::Graceful => PoolState::SoftShutdown,
        }
    }
}

/// Everything guarded by the pool lock.
pub(crate) struct Queue {
    pub(crate) tasks: TaskHeap,
    pub(crate) state: PoolState,
    pub(crate) live_workers: usize,
    pub(crate) next_seq: u64,
}

pub(crate) struct Shared {
    pub(crate) queue: Mutex<Queue>,
    /// Signalled when a task is queued or the state changes.
    pub(crate) available: Condvar,
    pub(crate) metrics: Metrics,
    pub(crate) panic_handler: PanicHandler,
}

struct WorkerHandle {
    id: WorkerId,
    thread: JoinHandle<()>,
}

/// A fixed set of worker threads consuming tasks from a shared priority heap.
///
/// Tasks with a numerically higher [`Priority`] are dequeued first; equal
/// priorities run in submission order. Task bodies always run outside the
/// pool lock, so a long task never blocks submitters.
///
/// Dropping a pool that is still running performs a graceful shutdown.
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<WorkerHandle>>,
    num_threads: usize,
}

impl ThreadPool {
    /// Start a pool with `num_threads` workers and default settings otherwise.
    pub fn new(num_threads: usize) -> Result<Self> {
        if num_threads == 0 {
            return Err(Error::invalid_argument("worker count must be at least 1"));
        }

        let config = Config::builder().num_threads(num_threads).build()?;
        Self::with_config(&config)
    }

    /// Start a pool from a full [`Config`].
    ///
    /// If any worker fails to start, the ones already running are stopped
    /// and joined, and [`Error::ThreadSpawn`] is returned.
    pub fn with_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let num_threads = config.worker_threads();
        if num_threads == 0 {
            return Err(Error::invalid_argument("worker count must be at least 1"));
        }

        let tasks = Heap::with_capacity(config.queue_capacity, Task::runs_before as TaskOrder)
            .map_err(Error::AllocationFailure)?;

        let mut handles = Vec::new();
        handles
            .try_reserve_exact(num_threads)
            .map_err(Error::AllocationFailure)?;

        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue {
                tasks,
                state: PoolState::Running,
                live_workers: 0,
                next_seq: 0,
            }),
            available: Condvar::new(),
            metrics: Metrics::new(),
            panic_handler: PanicHandler::new(config.panic_strategy),
        });

        for id in 0..num_threads {
            let name = format!("{}-{}", config.thread_name_prefix, id);
            let mut builder = thread::Builder::new().name(name);

            if let Some(stack_size) = config.stack_size {
                builder = builder.stack_size(stack_size);
            }

            // registered before spawning so the worker can never deregister first
            shared.queue.lock().live_workers += 1;

            let worker = Worker::new(id, Arc::clone(&shared));
            match builder.spawn(move || worker.run()) {
                Ok(thread) => handles.push(WorkerHandle { id, thread }),
                Err(e) => {
                    shared.queue.lock().live_workers -= 1;
                    tracing::error!(worker = id, error = %e, "failed to spawn worker, stopping pool");
                    abort_startup(&shared, handles);
                    return Err(Error::ThreadSpawn(e));
                }
            }
        }

        tracing::debug!(
            threads = num_threads,
            queue_capacity = config.queue_capacity,
            "thread pool started"
        );

        Ok(Self {
            shared,
            workers: Mutex::new(handles),
            num_threads,
        })
    }

    /// Queue `f` at `priority` without tracking its completion.
    ///
    /// Fails with [`Error::AlreadyShuttingDown`] once shutdown has begun; the
    /// closure is then dropped without running.
    pub fn submit<F>(&self, f: F, priority: impl Into<Priority>) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(f, priority.into())
    }

    /// Queue `f` at `priority` and return a handle to its result.
    ///
    /// The task runs asynchronously; the handle is returned straight away.
    /// On failure no handle is produced and nothing is left behind.
    pub fn submit_with_future<F, R>(
        &self,
        f: F,
        priority: impl Into<Priority>,
    ) -> Result<TaskFuture<R>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (promise, future) = future::promise();
        self.enqueue(move || promise.complete(f()), priority.into())?;
        Ok(future)
    }

    /// [`submit`](Self::submit) at [`Priority::NORMAL`].
    pub fn execute<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(f, Priority::NORMAL)
    }

    /// [`submit_with_future`](Self::submit_with_future) at [`Priority::NORMAL`].
    pub fn spawn<F, R>(&self, f: F) -> Result<TaskFuture<R>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit_with_future(f, Priority::NORMAL)
    }

    fn enqueue<F>(&self, f: F, priority: Priority) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let rejected = {
            let mut queue = self.shared.queue.lock();

            if queue.state != PoolState::Running {
                drop(queue);
                self.shared.metrics.record_rejected();
                tracing::debug!(%priority, "rejected task: pool is shutting down");
                return Err(Error::AlreadyShuttingDown);
            }

            let seq = queue.next_seq;
            let task = Task::new(f, priority, seq);
            let tid = task.id;

            match queue.tasks.push(task) {
                Ok(()) => {
                    queue.next_seq += 1;
                    self.shared.available.notify_one();
                    self.shared.metrics.record_submitted();
                    tracing::trace!(task = %tid, %priority, "task queued");
                    return Ok(());
                }
                Err(err) => err,
            }
        };

        // dropped outside the pool lock
        let (task, source) = rejected.into_parts();
        drop(task);
        self.shared.metrics.record_rejected();
        tracing::warn!(error = %source, "task queue could not grow");
        Err(Error::AllocationFailure(source))
    }

    /// Stop the pool and wait for every worker to exit.
    ///
    /// The first call moves the pool out of [`PoolState::Running`]; any later
    /// call, or any call racing with it, gets [`Error::AlreadyShuttingDown`]
    /// and joins nothing. With [`ShutdownMode::Immediate`] the queued tasks
    /// are dropped, which resolves their futures to `None`.
    pub fn shutdown(&self, mode: ShutdownMode) -> Result<()> {
        let discarded = {
            let mut queue = self.shared.queue.lock();
            if queue.state != PoolState::Running {
                return Err(Error::AlreadyShuttingDown);
            }

            queue.state = mode.target_state();
            let discarded = match mode {
                ShutdownMode::Immediate => queue.tasks.drain(),
                ShutdownMode::Graceful => Vec::new(),
            };
            self.shared.available.notify_all();
            discarded
        };

        tracing::debug!(?mode, discarded = discarded.len(), "thread pool shutting down");
        self.shared.metrics.record_discarded(discarded.len());
        drop(discarded);

        let handles = std::mem::take(&mut *self.workers.lock());
        let current = thread::current().id();
        let mut joined_all = true;
        let mut result = Ok(());

        for handle in handles {
            if handle.thread.thread().id() == current {
                // shutdown called from one of our own tasks; that worker
                // marks the pool stopped when it exits
                tracing::warn!(worker = handle.id, "not joining the calling worker thread");
                joined_all = false;
                continue;
            }

            if handle.thread.join().is_err() && result.is_ok() {
                result = Err(Error::thread_join(format!("worker {} panicked", handle.id)));
            }
        }

        if joined_all {
            self.shared.queue.lock().state = PoolState::Stopped;
            tracing::debug!("thread pool stopped");
        }

        result
    }

    /// Number of workers the pool was started with.
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Workers that have started and not yet exited.
    pub fn live_workers(&self) -> usize {
        self.shared.queue.lock().live_workers
    }

    /// Tasks waiting in the queue, not counting the ones being executed.
    pub fn queued_tasks(&self) -> usize {
        self.shared.queue.lock().tasks.len()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PoolState {
        self.shared.queue.lock().state
    }

    /// Whether the pool still accepts submissions.
    pub fn is_running(&self) -> bool {
        self.state() == PoolState::Running
    }

    /// Snapshot of the pool counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }
}

fn abort_startup(shared: &Shared, handles: Vec<WorkerHandle>) {
    shared.queue.lock().state = PoolState::HardShutdown;
    shared.available.notify_all();

    for handle in handles {
        if handle.thread.join().is_err() {
            tracing::warn!(worker = handle.id, "worker panicked during aborted startup");
        }
    }
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.shared.queue.lock();
        f.debug_struct("ThreadPool")
            .field("num_threads", &self.num_threads)
            .field("live_workers", &queue.live_workers)
            .field("queued_tasks", &queue.tasks.len())
            .field("state", &queue.state)
            .finish()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        if self.is_running() {
            if let Err(e) = self.shutdown(ShutdownMode::Graceful) {
                tracing::warn!(error = %e, "thread pool shutdown on drop failed");
            }
        }
    }
}
