//! Commonly used types.
//!
//! ```
//! use pripool::prelude::*;
//! ```

pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{Error, Result};
pub use crate::executor::{
    PanicStrategy, PoolState, Priority, ShutdownMode, TaskFuture, ThreadPool,
};
pub use crate::scheduler::Heap;
pub use crate::telemetry::MetricsSnapshot;
