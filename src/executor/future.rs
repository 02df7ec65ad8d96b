//! Single-result handoff between the worker running a task and the thread
//! that submitted it.
//!
//! Each pair shares one slot with its own lock and condition variable, so
//! waiting on a result never touches the pool lock. The producer half
//! ([`Promise`]) settles the slot exactly once: either with a value through
//! [`Promise::complete`], or as abandoned when it is dropped unfulfilled
//! (the task was discarded by an immediate shutdown, or it panicked).
//! Either way every waiter is woken.

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

enum State<T> {
    Pending,
    Done(T),
    Abandoned,
}

impl<T> State<T> {
    fn is_pending(&self) -> bool {
        matches!(self, State::Pending)
    }

    fn take(&mut self) -> Option<T> {
        match std::mem::replace(self, State::Abandoned) {
            State::Done(value) => Some(value),
            State::Pending | State::Abandoned => None,
        }
    }
}

struct Slot<T> {
    state: Mutex<State<T>>,
    ready: Condvar,
}

impl<T> Slot<T> {
    fn settle(&self, outcome: State<T>) {
        let mut state = self.state.lock();
        // write-once
        if state.is_pending() {
            *state = outcome;
        }
        self.ready.notify_all();
    }
}

/// Create a connected producer/consumer pair.
pub(crate) fn promise<T>() -> (Promise<T>, TaskFuture<T>) {
    let slot = Arc::new(Slot {
        state: Mutex::new(State::Pending),
        ready: Condvar::new(),
    });

    (
        Promise {
            slot: Some(Arc::clone(&slot)),
        },
        TaskFuture { slot },
    )
}

/// Producer half, owned by the task that computes the value.
pub(crate) struct Promise<T> {
    slot: Option<Arc<Slot<T>>>,
}

impl<T> Promise<T> {
    pub(crate) fn complete(mut self, value: T) {
        if let Some(slot) = self.slot.take() {
            slot.settle(State::Done(value));
        }
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.settle(State::Abandoned);
        }
    }
}

/// Handle to the eventual result of a task submitted with
/// [`ThreadPool::submit_with_future`](crate::ThreadPool::submit_with_future).
///
/// Waiting consumes the handle, so a result can be taken at most once.
pub struct TaskFuture<T> {
    slot: Arc<Slot<T>>,
}

impl<T> TaskFuture<T> {
    /// Block until the task has produced its value.
    ///
    /// Returns `None` if the task will never run to completion: it was
    /// discarded by an immediate shutdown, or it panicked.
    pub fn wait(self) -> Option<T> {
        let mut state = self.slot.state.lock();
        while state.is_pending() {
            self.slot.ready.wait(&mut state);
        }
        state.take()
    }

    /// Like [`wait`](Self::wait), but gives up after `timeout`.
    ///
    /// On timeout the handle is returned in `Err` so the caller can keep
    /// waiting later.
    pub fn wait_timeout(self, timeout: Duration) -> Result<Option<T>, Self> {
        let deadline = match Instant::now().checked_add(timeout) {
            Some(deadline) => deadline,
            None => return Ok(self.wait()),
        };

        {
            let mut state = self.slot.state.lock();
            while state.is_pending() {
                if self.slot.ready.wait_until(&mut state, deadline).timed_out() {
                    break;
                }
            }
            if !state.is_pending() {
                return Ok(state.take());
            }
        }

        Err(self)
    }

    /// Whether the task has finished, successfully or not. Never blocks on
    /// the task itself.
    pub fn is_done(&self) -> bool {
        !self.slot.state.lock().is_pending()
    }
}

impl<T> fmt::Debug for TaskFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.slot.state.lock() {
            State::Pending => "pending",
            State::Done(_) => "done",
            State::Abandoned => "abandoned",
        };
        f.debug_struct("TaskFuture").field("state", &state).finish()
    }
}
