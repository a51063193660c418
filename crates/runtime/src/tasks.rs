//! Fire-and-forget background tasks.

use combat_core::IdentityId;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::notify::Notification;

/// Units of work handed to the background worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Task {
    Notify(Notification),
    /// Remove expired time-limited units from one account.
    PurgeExpired { identity: IdentityId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("task queue is full")]
    Full,

    #[error("task queue is closed")]
    Closed,
}

/// Schedules a task without waiting for it to run. Delivery is at most once.
pub trait TaskQueue: Send + Sync {
    fn enqueue(&self, task: Task) -> Result<(), QueueError>;
}

/// Bounded in-process queue drained by [`crate::NotificationWorker`].
#[derive(Clone)]
pub struct ChannelTaskQueue {
    tx: mpsc::Sender<Task>,
}

impl ChannelTaskQueue {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Task>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl TaskQueue for ChannelTaskQueue {
    fn enqueue(&self, task: Task) -> Result<(), QueueError> {
        self.tx.try_send(task).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_and_closed_queues_are_reported() {
        let (queue, mut rx) = ChannelTaskQueue::channel(1);
        let purge = Task::PurgeExpired {
            identity: IdentityId(1),
        };

        queue.enqueue(purge.clone()).unwrap();
        assert_eq!(queue.enqueue(purge.clone()), Err(QueueError::Full));

        assert_eq!(rx.try_recv().ok(), Some(purge.clone()));
        drop(rx);
        assert_eq!(queue.enqueue(purge), Err(QueueError::Closed));
    }
}
