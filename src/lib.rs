//! pripool - a fixed-size worker pool over a shared priority heap
//!
//! Callers submit closures with an integer priority; a fixed set of worker
//! threads pops the highest-priority task from a binary heap and runs it.
//! Submissions can optionally return a [`TaskFuture`] that blocks until the
//! task has produced its value.
//!
//! # Quick Start
//!
//! ```no_run
//! use pripool::prelude::*;
//!
//! let pool = ThreadPool::new(4).unwrap();
//!
//! pool.submit(|| println!("background work"), 0).unwrap();
//!
//! let answer = pool.submit_with_future(|| 6 * 7, 10).unwrap();
//! assert_eq!(answer.wait(), Some(42));
//!
//! pool.shutdown(ShutdownMode::Graceful).unwrap();
//! ```
//!
//! # Shutdown
//!
//! - [`ShutdownMode::Graceful`] stops accepting work and drains the queue.
//! - [`ShutdownMode::Immediate`] stops accepting work and discards queued
//!   tasks; tasks already running finish. Futures of discarded tasks
//!   resolve to `None`.
//!
//! Either mode can be entered once. Submissions after that fail with
//! [`Error::AlreadyShuttingDown`].

// Lint configuration
#![warn(missing_docs, missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod scheduler;
pub mod telemetry;

// Re-export key types at crate root
pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use executor::{PoolState, Priority, ShutdownMode, TaskFuture, ThreadPool};
pub use scheduler::Heap;
