//! In-memory unread trackers and clan rosters.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use combat_core::{ClanId, IdentityId};

use crate::repository::{RepositoryError, Result, Tracker, TrackerStore};

#[derive(Default)]
struct Trackers {
    rosters: HashMap<ClanId, BTreeSet<IdentityId>>,
    counters: HashMap<IdentityId, Tracker>,
}

impl Trackers {
    fn tracker_mut(&mut self, identity: IdentityId) -> &mut Tracker {
        self.counters
            .entry(identity)
            .or_insert_with(|| Tracker::new(identity))
    }
}

/// Trackers and clan rosters behind one lock; a clan update is applied to
/// every member under a single write guard.
#[derive(Default)]
pub struct InMemoryTrackerStore {
    inner: RwLock<Trackers>,
}

impl InMemoryTrackerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join_clan(&self, clan: ClanId, identity: IdentityId) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        inner.rosters.entry(clan).or_default().insert(identity);
        Ok(())
    }
}

#[async_trait]
impl TrackerStore for InMemoryTrackerStore {
    async fn increment(&self, identity: IdentityId) -> Result<u64> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let tracker = inner.tracker_mut(identity);
        tracker.unread += 1;
        Ok(tracker.unread)
    }

    async fn increment_clan(&self, clan: ClanId, exclude: IdentityId) -> Result<Vec<IdentityId>> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;

        let members: Vec<IdentityId> = inner
            .rosters
            .get(&clan)
            .map(|roster| roster.iter().copied().filter(|m| *m != exclude).collect())
            .unwrap_or_default();

        for member in &members {
            inner.tracker_mut(*member).clan_unread += 1;
        }
        Ok(members)
    }

    async fn get(&self, identity: IdentityId) -> Result<Tracker> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(inner
            .counters
            .get(&identity)
            .copied()
            .unwrap_or_else(|| Tracker::new(identity)))
    }
}
