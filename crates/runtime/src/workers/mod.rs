//! Worker tasks that back the combat service.
//!
//! The notification worker drains the background task queue; its counters
//! can be read while it runs.

mod metrics;
mod notification;

pub use metrics::{MetricsSnapshot, WorkerMetrics};
pub use notification::NotificationWorker;
