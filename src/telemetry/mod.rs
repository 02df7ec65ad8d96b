//! Telemetry for monitoring pool behavior.

pub mod metrics;

pub use metrics::{Metrics, MetricsSnapshot};
