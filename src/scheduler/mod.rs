//! Task ordering.
//!
//! Pending tasks live in a binary heap ordered by a caller-supplied
//! predicate; the pool uses "higher priority first, then submission order".

pub mod heap;

pub use heap::{Heap, PushError, DEFAULT_CAPACITY};
