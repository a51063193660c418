//! Contention-tolerant sharded counter.
//!
//! Writes go to one randomly chosen shard so concurrent callers rarely touch
//! the same record. Reads sum the shards, or return a cached approximate
//! total when one is available.
//!
//! # Sequence ids
//!
//! [`ShardedCounter::increment_and_count`] derives its id from the single
//! fetch-and-add it performs:
//!
//! ```text
//! id = (shard_value - 1) * shards + shard + 1
//! ```
//!
//! Every `(shard, shard_value)` pair is handed out exactly once, so ids never
//! repeat across concurrent callers. They are dense per shard but not
//! globally ordered.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::Rng;
use thiserror::Error;
use tracing::trace;

use crate::repository::{CounterStore, RepositoryError};

#[derive(Debug, Error)]
pub enum CounterError {
    #[error("counter store failed")]
    Store(#[from] RepositoryError),

    #[error("counter cache lock was poisoned")]
    LockPoisoned,
}

pub struct ShardedCounter {
    store: Arc<dyn CounterStore>,
    shards: u32,
    cache: Mutex<HashMap<String, u64>>,
}

impl ShardedCounter {
    pub fn new(store: Arc<dyn CounterStore>, shards: u32) -> Self {
        Self {
            store,
            shards: shards.max(1),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn shards(&self) -> u32 {
        self.shards
    }

    /// Adds one to a random shard. Returns that shard's new value.
    pub async fn increment(&self, name: &str) -> Result<u64, CounterError> {
        let (_, value) = self.bump(name).await?;
        Ok(value)
    }

    /// Approximate total: cached if present, otherwise summed from the shards.
    pub async fn count(&self, name: &str) -> Result<u64, CounterError> {
        {
            let cache = self.cache.lock().map_err(|_| CounterError::LockPoisoned)?;
            if let Some(total) = cache.get(name) {
                return Ok(*total);
            }
        }

        let total: u64 = self
            .store
            .shard_values(name, self.shards)
            .await?
            .into_iter()
            .sum();

        let mut cache = self.cache.lock().map_err(|_| CounterError::LockPoisoned)?;
        cache.insert(name.to_string(), total);
        Ok(total)
    }

    /// Increments and returns a newly assigned, never repeated id.
    pub async fn increment_and_count(&self, name: &str) -> Result<u64, CounterError> {
        let (shard, value) = self.bump(name).await?;
        let id = (value - 1) * u64::from(self.shards) + u64::from(shard) + 1;
        trace!("{} assigned id {} from shard {} value {}", name, id, shard, value);
        Ok(id)
    }

    async fn bump(&self, name: &str) -> Result<(u32, u64), CounterError> {
        let shard = rand::thread_rng().gen_range(0..self.shards);
        let value = self.store.fetch_add(name, shard, 1).await?;

        // The cached total is best effort; only refresh an existing entry.
        if let Ok(mut cache) = self.cache.lock()
            && let Some(total) = cache.get_mut(name)
        {
            *total += 1;
        }

        Ok((shard, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryCounterStore;
    use std::collections::HashSet;

    fn counter(shards: u32) -> Arc<ShardedCounter> {
        Arc::new(ShardedCounter::new(
            Arc::new(InMemoryCounterStore::new()),
            shards,
        ))
    }

    #[tokio::test]
    async fn count_sums_shards_and_tracks_increments() {
        let counter = counter(3);
        for _ in 0..5 {
            counter.increment("hits").await.unwrap();
        }
        assert_eq!(counter.count("hits").await.unwrap(), 5);

        counter.increment("hits").await.unwrap();
        assert_eq!(counter.count("hits").await.unwrap(), 6);
        assert_eq!(counter.count("misses").await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_ids_never_repeat() {
        let counter = counter(3);
        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..200 {
            let counter = Arc::clone(&counter);
            tasks.spawn(async move { counter.increment_and_count("events").await.unwrap() });
        }

        let mut seen = HashSet::new();
        while let Some(id) = tasks.join_next().await {
            assert!(seen.insert(id.unwrap()), "duplicate id");
        }
        assert_eq!(seen.len(), 200);
        assert!(!seen.contains(&0));
    }

    #[tokio::test]
    async fn single_shard_ids_are_sequential() {
        let counter = counter(1);
        let mut ids = Vec::new();
        for _ in 0..4 {
            ids.push(counter.increment_and_count("events").await.unwrap());
        }
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }
}
