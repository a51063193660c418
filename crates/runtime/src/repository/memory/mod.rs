//! In-memory repository implementations for tests and the demo binary.

mod account;
mod counter;
mod directory;
mod event;
mod tracker;

pub use account::InMemoryAccountStore;
pub use counter::InMemoryCounterStore;
pub use directory::{InMemorySubscriptions, InMemoryWarDirectory};
pub use event::InMemoryEventRepository;
pub use tracker::InMemoryTrackerStore;
