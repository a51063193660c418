//! Event store kept in process memory.

use std::sync::RwLock;

use async_trait::async_trait;
use combat_core::{Event, IdentityId};

use crate::repository::{EventRepository, RepositoryError, Result};

/// Events in append order. Lost when the process exits.
#[derive(Default)]
pub struct InMemoryEventRepository {
    events: RwLock<Vec<Event>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored event, oldest first.
    pub fn snapshot(&self) -> Result<Vec<Event>> {
        self.events
            .read()
            .map(|events| events.clone())
            .map_err(|_| RepositoryError::LockPoisoned)
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn append(&self, event: &Event) -> Result<()> {
        self.append_batch(std::slice::from_ref(event)).await
    }

    async fn append_batch(&self, batch: &[Event]) -> Result<()> {
        let mut events = self
            .events
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;

        events.extend_from_slice(batch);
        Ok(())
    }

    async fn list_for(&self, identity: IdentityId) -> Result<Vec<Event>> {
        let events = self
            .events
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;

        Ok(events
            .iter()
            .filter(|event| event.owner == identity)
            .cloned()
            .collect())
    }
}
