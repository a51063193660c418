//! In-memory subscription and war directories.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use combat_core::{ActionKind, ClanId, IdentityId};

use crate::notify::Channel;
use crate::repository::{RepositoryError, Result, SubscriptionDirectory, WarDirectory};

#[derive(Default)]
pub struct InMemorySubscriptions {
    channels: RwLock<HashMap<(IdentityId, ActionKind), Vec<Channel>>>,
}

impl InMemorySubscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `identity` to `action` events on `channel`. Repeated
    /// subscriptions are ignored.
    pub fn subscribe(&self, identity: IdentityId, action: ActionKind, channel: Channel) -> Result<()> {
        let mut channels = self
            .channels
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let entry = channels.entry((identity, action)).or_default();
        if !entry.contains(&channel) {
            entry.push(channel);
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriptionDirectory for InMemorySubscriptions {
    async fn channels(&self, identity: IdentityId, action: ActionKind) -> Result<Vec<Channel>> {
        let channels = self
            .channels
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(channels.get(&(identity, action)).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct InMemoryWarDirectory {
    declarations: RwLock<HashSet<(ClanId, ClanId)>>,
}

impl InMemoryWarDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&self, from: ClanId, to: ClanId) -> Result<()> {
        let mut declarations = self
            .declarations
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        declarations.insert((from, to));
        Ok(())
    }
}

#[async_trait]
impl WarDirectory for InMemoryWarDirectory {
    async fn has_declared(&self, from: ClanId, to: ClanId) -> Result<bool> {
        let declarations = self
            .declarations
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(declarations.contains(&(from, to)))
    }
}
