//! Topic-based event bus implementation.

use combat_core::{Event, IdentityId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::notify::Notification;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Resolved engagements and account maintenance
    Combat,
    /// Outbound notification delivery
    Notification,
}

/// Event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RuntimeEvent {
    /// A persisted resolution event with its sequence assigned.
    Resolved(Event),
    /// Expired units were removed from an account.
    Purged { identity: IdentityId, units: i64 },
    Delivered(Notification),
    DeliveryFailed {
        notification: Notification,
        reason: String,
    },
}

impl RuntimeEvent {
    pub fn topic(&self) -> Topic {
        match self {
            RuntimeEvent::Resolved(_) | RuntimeEvent::Purged { .. } => Topic::Combat,
            RuntimeEvent::Delivered(_) | RuntimeEvent::DeliveryFailed { .. } => {
                Topic::Notification
            }
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Clones share the same channels.
#[derive(Clone)]
pub struct EventBus {
    combat: broadcast::Sender<RuntimeEvent>,
    notification: broadcast::Sender<RuntimeEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            combat: broadcast::channel(capacity).0,
            notification: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<RuntimeEvent> {
        match topic {
            Topic::Combat => &self.combat,
            Topic::Notification => &self.notification,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: RuntimeEvent) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<RuntimeEvent> {
        self.sender(topic).subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let bus = EventBus::with_capacity(4);
        let mut combat = bus.subscribe(Topic::Combat);
        let mut notifications = bus.subscribe(Topic::Notification);

        bus.publish(RuntimeEvent::Purged {
            identity: IdentityId(3),
            units: 2,
        });

        assert!(matches!(
            combat.recv().await.unwrap(),
            RuntimeEvent::Purged { units: 2, .. }
        ));
        assert!(notifications.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.publish(RuntimeEvent::Purged {
            identity: IdentityId(1),
            units: 0,
        });
    }
}
