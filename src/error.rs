//! Error types for pripool

use std::collections::TryReserveError;

/// Result type for pripool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by pool and config operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller-supplied value was out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The task heap could not grow.
    #[error("task queue allocation failed: {0}")]
    AllocationFailure(#[source] TryReserveError),

    /// Submission or shutdown after shutdown had begun.
    #[error("pool is already shutting down")]
    AlreadyShuttingDown,

    /// The OS refused to start a worker.
    #[error("failed to spawn worker thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),

    /// A worker thread panicked outside task isolation.
    #[error("failed to join worker thread: {0}")]
    ThreadJoin(String),

    /// Invalid [`Config`](crate::Config).
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Build an [`Error::InvalidArgument`].
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Build an [`Error::Config`].
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Build an [`Error::ThreadJoin`].
    pub fn thread_join<S: Into<String>>(msg: S) -> Self {
        Error::ThreadJoin(msg.into())
    }

    /// Whether the error came from submitting to (or shutting down) a pool
    /// that had already left the running state.
    pub fn is_shutting_down(&self) -> bool {
        matches!(self, Error::AlreadyShuttingDown)
    }
}
