//! Repository layer for combat state and its side effects.
//!
//! Repositories hold data that CHANGES as engagements resolve:
//! - Account state (loaded and committed atomically per resolution)
//! - Counter shards, events and unread trackers
//! - Subscription and war directories owned by other services
//!
//! The store traits are the only seam the service talks through; the
//! `memory` and `file` modules provide local implementations.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileEventLog;
pub use memory::{
    InMemoryAccountStore, InMemoryCounterStore, InMemoryEventRepository, InMemorySubscriptions,
    InMemoryTrackerStore, InMemoryWarDirectory,
};
pub use traits::{
    AccountStore, CounterStore, EventRepository, SubscriptionDirectory, Tracker, TrackerStore,
    WarDirectory,
};
