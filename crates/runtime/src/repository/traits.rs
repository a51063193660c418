//! Contracts for the stores the combat service reads from and writes to.
//!
//! Every trait is object safe and used behind `Arc<dyn _>` so the service can
//! be wired with in-memory, file-backed or external implementations.

use async_trait::async_trait;
use combat_core::{AccountState, ActionKind, ClanId, Event, IdentityId};
use serde::{Deserialize, Serialize};

use super::Result;
use crate::notify::Channel;

/// Loads and atomically commits account state.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Load one identity's pools and unit groups.
    ///
    /// Fails with `NotFound` for unknown identities and `Transient` when the
    /// backend is temporarily unavailable.
    async fn load(&self, identity: IdentityId) -> Result<AccountState>;

    /// Persist every record or none of them.
    ///
    /// Each record carries the version it was loaded at; if any stored
    /// version moved on in the meantime the whole commit fails with
    /// `Aborted` and nothing is written. On success every stored version is
    /// bumped by one.
    async fn commit(&self, records: Vec<AccountState>) -> Result<()>;
}

/// Shard records backing [`crate::counter::ShardedCounter`].
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically add `delta` to one shard and return its new value.
    async fn fetch_add(&self, name: &str, shard: u32, delta: u64) -> Result<u64>;

    /// Current value of shards `0..shards`; missing shards read as zero.
    async fn shard_values(&self, name: &str, shards: u32) -> Result<Vec<u64>>;
}

/// Append-only store of resolution events.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Append one event.
    async fn append(&self, event: &Event) -> Result<()>;

    /// Append several events in one write.
    async fn append_batch(&self, events: &[Event]) -> Result<()>;

    /// Every stored event owned by `identity`, oldest first.
    async fn list_for(&self, identity: IdentityId) -> Result<Vec<Event>>;
}

/// Unread-notification counters of one identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracker {
    pub identity: IdentityId,
    /// Events that targeted this identity directly.
    pub unread: u64,
    /// Events that reached this identity through its clan.
    pub clan_unread: u64,
}

impl Tracker {
    pub fn new(identity: IdentityId) -> Self {
        Self {
            identity,
            unread: 0,
            clan_unread: 0,
        }
    }
}

#[async_trait]
pub trait TrackerStore: Send + Sync {
    /// Bump the personal unread counter and return its new value.
    async fn increment(&self, identity: IdentityId) -> Result<u64>;

    /// Bump the clan counter of every member except `exclude` as one
    /// clan-scoped update. Returns the members that were bumped.
    async fn increment_clan(&self, clan: ClanId, exclude: IdentityId) -> Result<Vec<IdentityId>>;

    async fn get(&self, identity: IdentityId) -> Result<Tracker>;
}

/// Which channels an identity wants to hear about an action on.
#[async_trait]
pub trait SubscriptionDirectory: Send + Sync {
    async fn channels(&self, identity: IdentityId, action: ActionKind) -> Result<Vec<Channel>>;
}

/// Clan war declarations.
#[async_trait]
pub trait WarDirectory: Send + Sync {
    /// Whether `from` has declared war on `to`.
    async fn has_declared(&self, from: ClanId, to: ClanId) -> Result<bool>;
}
