//! Async runtime around the combat rules.
//!
//! This crate wires `combat-core` to its stores and side effects. Consumers
//! build a [`CombatService`], submit attack, spy and infiltration requests,
//! and subscribe to the [`EventBus`] for what happens afterwards.
//!
//! Modules are organized by responsibility:
//! - [`orchestrator`] loads, resolves and commits one engagement
//! - [`dispatch`] sequences, persists and fans out the resulting events
//! - [`counter`] hands out event sequence ids from sharded records
//! - [`api`] exposes the error types downstream clients interact with
//! - [`events`] provides the topic-based bus for live consumers
//! - [`notify`] and [`tasks`] cover outbound delivery and background work
//! - [`repository`] defines the store contracts and local implementations
pub mod api;
pub mod config;
pub mod counter;
pub mod dispatch;
pub mod events;
pub mod notify;
pub mod orchestrator;
pub mod repository;
pub mod tasks;
pub mod war;

mod workers;

pub use api::{CombatError, ErrorSeverity, Result};
pub use config::{CounterConfig, DispatchConfig, RuntimeConfig};
pub use counter::{CounterError, ShardedCounter};
pub use dispatch::{DispatchError, Dispatched, EventDispatcher};
pub use events::{EventBus, RuntimeEvent, Topic};
pub use notify::{Channel, Courier, Couriers, DeliveryError, LogCourier, Notification};
pub use orchestrator::{CombatService, CombatServiceBuilder};
pub use repository::{
    AccountStore, CounterStore, EventRepository, FileEventLog, InMemoryAccountStore,
    InMemoryCounterStore, InMemoryEventRepository, InMemorySubscriptions, InMemoryTrackerStore,
    InMemoryWarDirectory, RepositoryError, SubscriptionDirectory, Tracker, TrackerStore,
    WarDirectory,
};
pub use tasks::{ChannelTaskQueue, QueueError, Task, TaskQueue};
pub use war::resolve_war_status;
pub use workers::{MetricsSnapshot, NotificationWorker, WorkerMetrics};
