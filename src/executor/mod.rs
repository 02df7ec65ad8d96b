//! Task execution infrastructure.
//!
//! This module provides the worker pool, the worker loop, the task record
//! and the future handles used to collect task results.

pub mod future;
pub mod panic_handler;
pub mod pool;
pub mod task;
pub mod worker;

pub use future::TaskFuture;
pub use panic_handler::{PanicHandler, PanicReport, PanicStrategy};
pub use pool::{PoolState, ShutdownMode, ThreadPool};
pub use task::{Priority, TaskId};
pub use worker::WorkerId;
