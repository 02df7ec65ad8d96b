//! Task representation and execution.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Global task ID counter
static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Scheduling priority. Numerically larger values run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Priority(pub i32);

impl Priority {
    /// Below normal.
    pub const LOW: Priority = Priority(-10);
    /// Used by `execute` and `spawn`.
    pub const NORMAL: Priority = Priority(0);
    /// Above normal.
    pub const HIGH: Priority = Priority(10);

    /// The raw priority value.
    pub fn get(self) -> i32 {
        self.0
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Priority(value)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Internal task representation
pub(crate) struct Task {
    pub(crate) id: TaskId,
    pub(crate) func: Box<dyn FnOnce() + Send + 'static>,
    pub(crate) priority: Priority,
    /// Per-pool submission order, used to keep equal priorities FIFO.
    pub(crate) seq: u64,
    pub(crate) spawn_time: Instant,
}

impl Task {
    pub fn new<F>(f: F, priority: Priority, seq: u64) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Task {
            id: TaskId::next(),
            func: Box::new(f),
            priority,
            seq,
            spawn_time: Instant::now(),
        }
    }

    /// Heap predicate: whether `self` must be dequeued before `other`.
    pub fn runs_before(&self, other: &Task) -> bool {
        self.priority > other.priority
            || (self.priority == other.priority && self.seq < other.seq)
    }

    /// Execute the task
    pub fn execute(self) {
        (self.func)();
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("seq", &self.seq)
            .field("spawn_time", &self.spawn_time)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::HIGH > Priority::NORMAL);
        assert!(Priority::NORMAL > Priority::LOW);
        assert_eq!(Priority::from(7).get(), 7);
        assert_eq!(Priority::default(), Priority::NORMAL);
    }

    #[test]
    fn test_runs_before() {
        let high = Task::new(|| {}, Priority(5), 10);
        let low = Task::new(|| {}, Priority(1), 0);
        let high_later = Task::new(|| {}, Priority(5), 11);

        assert!(high.runs_before(&low));
        assert!(!low.runs_before(&high));
        assert!(high.runs_before(&high_later));
        assert!(!high_later.runs_before(&high));
        assert!(!high.runs_before(&high));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Task::new(|| {}, Priority::NORMAL, 0);
        let b = Task::new(|| {}, Priority::NORMAL, 1);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_execute_runs_closure() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        Task::new(
            move || {
                h.fetch_add(1, Ordering::SeqCst);
            },
            Priority::NORMAL,
            0,
        )
        .execute();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
