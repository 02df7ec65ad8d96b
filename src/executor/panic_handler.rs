//! Isolation of panicking tasks.
//!
//! A panic inside a task never takes down its worker or the pool. The
//! strategy only decides whether the panic is logged.

use std::panic::{catch_unwind, AssertUnwindSafe};

/// What a worker does when a task panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanicStrategy {
    /// Swallow the panic silently; only the pool metrics record it.
    Isolate,
    /// Log the panic at warn level and keep the worker running.
    #[default]
    LogAndContinue,
}

/// Runs task bodies under `catch_unwind` according to a [`PanicStrategy`].
#[derive(Debug)]
pub struct PanicHandler {
    strategy: PanicStrategy,
}

impl PanicHandler {
    /// Create a handler using `strategy`.
    pub fn new(strategy: PanicStrategy) -> Self {
        Self { strategy }
    }

    /// Run `f`, turning a panic into a [`PanicReport`].
    pub fn execute<F, R>(&self, f: F) -> Result<R, PanicReport>
    where
        F: FnOnce() -> R,
    {
        catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
            let report = PanicReport::from_payload(payload);

            if self.strategy == PanicStrategy::LogAndContinue {
                tracing::warn!(message = %report.message, "task panicked");
            }
            report
        })
    }
}

/// Message recovered from a panic payload.
#[derive(Debug, Clone)]
pub struct PanicReport {
    /// The panic message, or `"unknown panic"` for non-string payloads.
    pub message: String,
}

impl PanicReport {
    fn from_payload(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };

        Self { message }
    }
}
