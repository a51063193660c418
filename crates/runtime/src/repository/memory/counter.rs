//! In-memory shard records.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::repository::{CounterStore, RepositoryError, Result};

type ShardKey = (String, u32);

/// One atomic cell per `(counter, shard)`.
///
/// The map lock is only held to find or create a cell; the increment itself
/// is a fetch-and-add on that cell alone.
#[derive(Default)]
pub struct InMemoryCounterStore {
    shards: RwLock<HashMap<ShardKey, Arc<AtomicU64>>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, name: &str, shard: u32) -> Result<Arc<AtomicU64>> {
        let key = (name.to_string(), shard);
        {
            let shards = self
                .shards
                .read()
                .map_err(|_| RepositoryError::LockPoisoned)?;
            if let Some(cell) = shards.get(&key) {
                return Ok(Arc::clone(cell));
            }
        }

        let mut shards = self
            .shards
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(Arc::clone(shards.entry(key).or_default()))
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn fetch_add(&self, name: &str, shard: u32, delta: u64) -> Result<u64> {
        let cell = self.cell(name, shard)?;
        Ok(cell.fetch_add(delta, Ordering::AcqRel) + delta)
    }

    async fn shard_values(&self, name: &str, shards: u32) -> Result<Vec<u64>> {
        let cells = self
            .shards
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok((0..shards)
            .map(|shard| {
                cells
                    .get(&(name.to_string(), shard))
                    .map_or(0, |cell| cell.load(Ordering::Acquire))
            })
            .collect())
    }
}
