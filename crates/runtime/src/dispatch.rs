//! Post-commit event fan-out.
//!
//! The dispatcher assigns one sequence id to the events of a resolution,
//! persists them, publishes them on the [`EventBus`] and then notifies the
//! owners and their clanmates. Every notified identity gets its own task in a
//! [`JoinSet`]; [`EventDispatcher::dispatch`] returns once all of them have
//! finished.

use std::sync::Arc;

use combat_core::{ActionKind, BattleResult, Event, IdentityId, Role, Sequence};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::counter::{CounterError, ShardedCounter};
use crate::events::{EventBus, RuntimeEvent};
use crate::notify::{Channel, Notification};
use crate::repository::{EventRepository, RepositoryError, SubscriptionDirectory, TrackerStore};
use crate::tasks::{Task, TaskQueue};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("nothing to dispatch")]
    Empty,

    #[error("failed to assign event sequence")]
    Counter(#[from] CounterError),

    #[error("failed to persist events")]
    Persist(#[source] RepositoryError),
}

/// Summary of one dispatch.
#[derive(Clone, Debug, PartialEq)]
pub struct Dispatched {
    pub sequence: Sequence,
    /// The events as persisted, sequence filled in.
    pub events: Vec<Event>,
    /// Identities whose fan-out task ran.
    pub notified: usize,
    /// Notification tasks handed to the queue.
    pub enqueued: usize,
    /// Subscription, queue or tracker failures; logged and not retried.
    pub failures: usize,
}

/// One identity to notify about one event.
#[derive(Clone, Copy, Debug)]
struct Recipient {
    identity: IdentityId,
    /// The event owner; clanmates are reached indirectly.
    direct: bool,
    action: ActionKind,
    event_owner: IdentityId,
    role: Role,
    result: BattleResult,
}

impl Recipient {
    fn of(event: &Event, identity: IdentityId) -> Self {
        Self {
            identity,
            direct: identity == event.owner,
            action: event.action,
            event_owner: event.owner,
            role: event.role,
            result: event.result,
        }
    }

    fn notification(&self, channel: Channel, sequence: Sequence) -> Notification {
        Notification {
            identity: self.identity,
            channel,
            action: self.action,
            sequence,
            event_owner: self.event_owner,
            role: self.role,
            result: self.result,
        }
    }
}

#[derive(Default)]
struct FanOut {
    enqueued: usize,
    failures: usize,
}

#[derive(Clone)]
pub struct EventDispatcher {
    counter: Arc<ShardedCounter>,
    events: Arc<dyn EventRepository>,
    trackers: Arc<dyn TrackerStore>,
    subscriptions: Arc<dyn SubscriptionDirectory>,
    queue: Arc<dyn TaskQueue>,
    bus: EventBus,
    sequence_name: String,
}

impl EventDispatcher {
    pub fn new(
        counter: Arc<ShardedCounter>,
        events: Arc<dyn EventRepository>,
        trackers: Arc<dyn TrackerStore>,
        subscriptions: Arc<dyn SubscriptionDirectory>,
        queue: Arc<dyn TaskQueue>,
        bus: EventBus,
        sequence_name: impl Into<String>,
    ) -> Self {
        Self {
            counter,
            events,
            trackers,
            subscriptions,
            queue,
            bus,
            sequence_name: sequence_name.into(),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Sequences, persists and fans out the events of one resolution.
    ///
    /// The sequence id and the persisted records exist before any
    /// notification is enqueued. Fan-out failures are logged and counted;
    /// only sequencing and persistence fail the call.
    pub async fn dispatch(&self, mut events: Vec<Event>) -> Result<Dispatched, DispatchError> {
        if events.is_empty() {
            return Err(DispatchError::Empty);
        }

        let sequence = self
            .counter
            .increment_and_count(&self.sequence_name)
            .await?;
        for event in &mut events {
            event.sequence = sequence;
        }

        let persisted = match events.as_slice() {
            [single] => self.events.append(single).await,
            batch => self.events.append_batch(batch).await,
        };
        persisted.map_err(DispatchError::Persist)?;

        for event in &events {
            self.bus.publish(RuntimeEvent::Resolved(event.clone()));
        }

        let mut failures = 0;
        let mut tasks = JoinSet::new();
        for event in &events {
            let (recipients, failed) = self.recipients(event).await;
            failures += failed;

            for recipient in recipients {
                let dispatcher = self.clone();
                tasks.spawn(async move { dispatcher.notify(recipient, sequence).await });
            }
        }

        let notified = tasks.len();
        let mut enqueued = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(fan_out) => {
                    enqueued += fan_out.enqueued;
                    failures += fan_out.failures;
                }
                Err(e) => {
                    warn!("notification task failed to complete: {}", e);
                    failures += 1;
                }
            }
        }

        debug!(
            "dispatched sequence {} to {} identities ({} notifications, {} failures)",
            sequence, notified, enqueued, failures
        );

        Ok(Dispatched {
            sequence,
            events,
            notified,
            enqueued,
            failures,
        })
    }

    /// The owner plus every clanmate except the acting player. Clan trackers
    /// are bumped here in one clan-scoped update.
    async fn recipients(&self, event: &Event) -> (Vec<Recipient>, usize) {
        let mut recipients = vec![Recipient::of(event, event.owner)];

        let Some(clan) = event.owner_clan else {
            return (recipients, 0);
        };

        match self.trackers.increment_clan(clan, event.actor()).await {
            Ok(members) => {
                recipients.extend(
                    members
                        .into_iter()
                        .filter(|member| *member != event.owner)
                        .map(|identity| Recipient::of(event, identity)),
                );
                (recipients, 0)
            }
            Err(e) => {
                warn!("clan {} tracker update failed: {}", clan, e);
                (recipients, 1)
            }
        }
    }

    async fn notify(&self, recipient: Recipient, sequence: Sequence) -> FanOut {
        let mut fan_out = FanOut::default();

        match self
            .subscriptions
            .channels(recipient.identity, recipient.action)
            .await
        {
            Ok(channels) => {
                for channel in channels {
                    let task = Task::Notify(recipient.notification(channel, sequence));
                    match self.queue.enqueue(task) {
                        Ok(()) => fan_out.enqueued += 1,
                        Err(e) => {
                            warn!(
                                "dropping {} notification for {}: {}",
                                channel, recipient.identity, e
                            );
                            fan_out.failures += 1;
                        }
                    }
                }
            }
            Err(e) => {
                warn!("subscriptions for {} unavailable: {}", recipient.identity, e);
                fan_out.failures += 1;
            }
        }

        if recipient.direct
            && let Err(e) = self.trackers.increment(recipient.identity).await
        {
            warn!("tracker update for {} failed: {}", recipient.identity, e);
            fan_out.failures += 1;
        }

        fan_out
    }
}
