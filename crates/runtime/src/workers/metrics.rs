//! Notification worker counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by [`super::NotificationWorker`].
///
/// Uses atomics so callers can read them while the worker runs.
#[derive(Debug, Default)]
pub struct WorkerMetrics {
    delivered: AtomicU64,
    failed: AtomicU64,
    /// Purge tasks that removed at least one unit.
    purges: AtomicU64,
    units_purged: AtomicU64,
}

impl WorkerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_delivery(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// `units` is the summed amount of the removed stacks.
    pub fn record_purge(&self, units: i64) {
        self.purges.fetch_add(1, Ordering::Relaxed);
        self.units_purged
            .fetch_add(units.max(0) as u64, Ordering::Relaxed);
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Share of delivery attempts that succeeded, 0-100.
    pub fn success_rate(&self) -> f64 {
        let delivered = self.delivered();
        let total = delivered + self.failed();
        if total == 0 {
            100.0
        } else {
            (delivered as f64 / total as f64) * 100.0
        }
    }

    /// Individual fields are read atomically; the snapshot as a whole is not.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            delivered: self.delivered(),
            failed: self.failed(),
            purges: self.purges.load(Ordering::Relaxed),
            units_purged: self.units_purged.load(Ordering::Relaxed),
            success_rate: self.success_rate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub delivered: u64,
    pub failed: u64,
    pub purges: u64,
    pub units_purged: u64,
    pub success_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_tracks_failures() {
        let metrics = WorkerMetrics::new();
        assert_eq!(metrics.success_rate(), 100.0);

        metrics.record_delivery();
        metrics.record_delivery();
        metrics.record_delivery();
        metrics.record_failure();
        metrics.record_purge(4);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.delivered, 3);
        assert_eq!(snapshot.units_purged, 4);
        assert_eq!(snapshot.success_rate, 75.0);
    }
}
