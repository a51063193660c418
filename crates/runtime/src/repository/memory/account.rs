//! In-memory account store with optimistic version checks.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use combat_core::{AccountState, IdentityId};

use crate::repository::{AccountStore, RepositoryError, Result};

/// Accounts kept in a map behind one lock.
///
/// A commit validates every record's version before writing any of them, so
/// a rejected commit leaves the map untouched.
#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<IdentityId, AccountState>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an account as-is, bypassing version checks.
    pub fn insert(&self, account: AccountState) -> Result<()> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        accounts.insert(account.identity, account);
        Ok(())
    }

    /// Current stored copy of an account (for testing/debugging).
    pub fn get(&self, identity: IdentityId) -> Result<Option<AccountState>> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(accounts.get(&identity).cloned())
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn load(&self, identity: IdentityId) -> Result<AccountState> {
        self.get(identity)?
            .ok_or(RepositoryError::NotFound(identity))
    }

    async fn commit(&self, records: Vec<AccountState>) -> Result<()> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;

        for record in &records {
            let stored = accounts
                .get(&record.identity)
                .map(|account| account.version)
                .ok_or(RepositoryError::NotFound(record.identity))?;
            if stored != record.version {
                return Err(RepositoryError::Aborted(format!(
                    "{} changed since load (version {} != {})",
                    record.identity, stored, record.version
                )));
            }
        }

        for mut record in records {
            record.version += 1;
            accounts.insert(record.identity, record);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::ResourcePools;

    fn account(id: u64, cycles: i64) -> AccountState {
        AccountState::new(
            IdentityId(id),
            ResourcePools {
                cycles,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn commit_bumps_versions() {
        let store = InMemoryAccountStore::new();
        store.insert(account(1, 10)).unwrap();
        store.insert(account(2, 20)).unwrap();

        let mut first = store.load(IdentityId(1)).await.unwrap();
        let second = store.load(IdentityId(2)).await.unwrap();
        first.pools.cycles = 99;
        store.commit(vec![first, second]).await.unwrap();

        let reloaded = store.load(IdentityId(1)).await.unwrap();
        assert_eq!(reloaded.version, 1);
        assert_eq!(reloaded.pools.cycles, 99);
        assert_eq!(store.load(IdentityId(2)).await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn stale_record_aborts_whole_commit() {
        let store = InMemoryAccountStore::new();
        store.insert(account(1, 10)).unwrap();
        store.insert(account(2, 20)).unwrap();

        let mut first = store.load(IdentityId(1)).await.unwrap();
        let mut stale = store.load(IdentityId(2)).await.unwrap();

        // Someone else commits the second account first.
        let concurrent = store.load(IdentityId(2)).await.unwrap();
        store.commit(vec![concurrent]).await.unwrap();

        first.pools.cycles = 0;
        stale.pools.cycles = 0;
        let err = store.commit(vec![first, stale]).await.unwrap_err();

        assert!(matches!(err, RepositoryError::Aborted(_)));
        assert_eq!(store.load(IdentityId(1)).await.unwrap().pools.cycles, 10);
        assert_eq!(store.load(IdentityId(2)).await.unwrap().pools.cycles, 20);
    }

    #[tokio::test]
    async fn unknown_identity_is_not_found() {
        let store = InMemoryAccountStore::new();
        let err = store.load(IdentityId(404)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(IdentityId(404))));
    }
}
