//! Background task worker.
//!
//! Drains the [`crate::tasks::ChannelTaskQueue`]: notifications are handed to
//! the courier of their channel, purge tasks remove expired units through a
//! commit of their own. Failures are logged and reported on the bus; nothing
//! is retried.

use std::sync::Arc;

use chrono::Utc;
use combat_core::IdentityId;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::events::{EventBus, RuntimeEvent};
use crate::notify::{Couriers, Notification};
use crate::repository::{AccountStore, Result};
use crate::tasks::Task;
use crate::workers::{MetricsSnapshot, WorkerMetrics};

pub struct NotificationWorker {
    tasks: mpsc::Receiver<Task>,
    couriers: Couriers,
    accounts: Arc<dyn AccountStore>,
    bus: EventBus,
    metrics: Arc<WorkerMetrics>,
}

impl NotificationWorker {
    pub fn new(
        tasks: mpsc::Receiver<Task>,
        couriers: Couriers,
        accounts: Arc<dyn AccountStore>,
        bus: EventBus,
    ) -> Self {
        Self {
            tasks,
            couriers,
            accounts,
            bus,
            metrics: Arc::new(WorkerMetrics::new()),
        }
    }

    /// Shared counters for querying while the worker runs.
    pub fn metrics(&self) -> Arc<WorkerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Runs until every queue handle has been dropped.
    pub async fn run(mut self) -> MetricsSnapshot {
        info!("NotificationWorker started");

        while let Some(task) = self.tasks.recv().await {
            match task {
                Task::Notify(notification) => self.deliver(notification).await,
                Task::PurgeExpired { identity } => match self.purge(identity).await {
                    Ok(units) => {
                        if units > 0 {
                            self.metrics.record_purge(units);
                        }
                        self.bus.publish(RuntimeEvent::Purged { identity, units });
                    }
                    Err(e) => warn!("purge for {} failed: {}", identity, e),
                },
            }
        }

        let snapshot = self.metrics.snapshot();
        info!(
            "NotificationWorker stopped ({} delivered, {} failed, {} purges)",
            snapshot.delivered, snapshot.failed, snapshot.purges
        );
        snapshot
    }

    async fn deliver(&self, notification: Notification) {
        match self.couriers.deliver(&notification).await {
            Ok(()) => {
                self.metrics.record_delivery();
                self.bus.publish(RuntimeEvent::Delivered(notification));
            }
            Err(e) => {
                warn!("notification delivery failed: {}", e);
                self.metrics.record_failure();
                self.bus.publish(RuntimeEvent::DeliveryFailed {
                    notification,
                    reason: e.to_string(),
                });
            }
        }
    }

    /// Removes expired units from one account. Returns the number of units
    /// removed, summed over all expired stacks.
    async fn purge(&self, identity: IdentityId) -> Result<i64> {
        let mut account = self.accounts.load(identity).await?;
        let removed = account.purge_expired(Utc::now());
        if removed.is_empty() {
            return Ok(0);
        }

        self.accounts.commit(vec![account]).await?;
        let units: i64 = removed.iter().map(|unit| unit.amount).sum();
        debug!(
            "purged {} expired units in {} stacks from {}",
            units,
            removed.len(),
            identity
        );
        Ok(units)
    }
}
