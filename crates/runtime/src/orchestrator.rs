//! Transaction orchestrator for combat requests.
//!
//! [`CombatService`] drives one engagement end to end: both accounts are
//! loaded concurrently, the request is validated, the battle is resolved in
//! `combat-core`, and both accounts are committed in a single all-or-nothing
//! write. Only after the commit are the two events handed to the
//! [`EventDispatcher`].
//!
//! A lost commit race surfaces as [`CombatError::Contention`]; the service
//! never retries on its own. Events that could not be sequenced or persisted
//! after the commit surface as [`CombatError::Undispatched`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use combat_core::{
    AccountState, ActionKind, CombatRequest, Commitment, IdentityId, PreparedEngagement,
    Resolution, resolve,
};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::api::{CombatError, Result};
use crate::config::RuntimeConfig;
use crate::counter::ShardedCounter;
use crate::dispatch::{DispatchError, Dispatched, EventDispatcher};
use crate::events::EventBus;
use crate::repository::{
    AccountStore, CounterStore, EventRepository, InMemoryCounterStore, InMemorySubscriptions,
    InMemoryTrackerStore, InMemoryWarDirectory, SubscriptionDirectory, TrackerStore, WarDirectory,
};
use crate::tasks::{Task, TaskQueue};
use crate::war::resolve_war_status;

/// Entry point for attack, spy and infiltration requests.
pub struct CombatService {
    config: RuntimeConfig,
    accounts: Arc<dyn AccountStore>,
    wars: Arc<dyn WarDirectory>,
    queue: Arc<dyn TaskQueue>,
    dispatcher: EventDispatcher,
}

impl CombatService {
    pub fn builder() -> CombatServiceBuilder {
        CombatServiceBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Bus carrying resolved events and notification outcomes.
    pub fn bus(&self) -> &EventBus {
        self.dispatcher.bus()
    }

    pub async fn attack(
        &self,
        attacker: IdentityId,
        defender: IdentityId,
        commitments: Vec<Commitment>,
    ) -> Result<Resolution> {
        self.execute(CombatRequest::new(
            ActionKind::Attack,
            attacker,
            defender,
            commitments,
        ))
        .await
    }

    pub async fn spy(
        &self,
        attacker: IdentityId,
        defender: IdentityId,
        commitments: Vec<Commitment>,
    ) -> Result<Resolution> {
        self.execute(CombatRequest::new(
            ActionKind::Spy,
            attacker,
            defender,
            commitments,
        ))
        .await
    }

    pub async fn infiltrate(
        &self,
        attacker: IdentityId,
        defender: IdentityId,
        commitments: Vec<Commitment>,
    ) -> Result<Resolution> {
        self.execute(CombatRequest::new(
            ActionKind::Infiltrate,
            attacker,
            defender,
            commitments,
        ))
        .await
    }

    /// Resolves one request and commits both accounts atomically.
    ///
    /// The returned accounts carry the versions they were committed at and
    /// both events carry their shared sequence. Fan-out failures are logged
    /// only.
    #[instrument(
        skip(self, request),
        fields(action = %request.action, attacker = %request.attacker, defender = %request.defender)
    )]
    pub async fn execute(&self, request: CombatRequest) -> Result<Resolution> {
        request.check_targets()?;

        let (attacker, defender) = tokio::join!(
            self.accounts.load(request.attacker),
            self.accounts.load(request.defender),
        );
        let (attacker, defender) = (attacker?, defender?);

        let now = Utc::now();
        let prepared = request.prepare(&attacker, now)?;

        let (settled, verdict) = oneshot::channel();
        let cleanup = self.spawn_cleanup(&attacker, &defender, now, verdict);
        let resolved = self.resolve_and_commit(&prepared, attacker, defender, now).await;
        let committed = match &resolved {
            Ok(_) => true,
            Err(e) => e.is_committed(),
        };
        let _ = settled.send(committed);

        let purges = cleanup.await.map_err(CombatError::Join)?;
        if purges > 0 {
            debug!("scheduled {} expired-unit purges", purges);
        }

        resolved
    }

    async fn resolve_and_commit(
        &self,
        prepared: &PreparedEngagement,
        attacker: AccountState,
        defender: AccountState,
        now: DateTime<Utc>,
    ) -> Result<Resolution> {
        let war = resolve_war_status(self.wars.as_ref(), attacker.clan, defender.clan).await?;

        let mut resolution = resolve(
            prepared,
            attacker,
            defender,
            war,
            now,
            &self.config.balance,
        )?;

        self.accounts
            .commit(vec![resolution.attacker.clone(), resolution.defender.clone()])
            .await?;
        resolution.attacker.version += 1;
        resolution.defender.version += 1;

        info!(
            "committed {} by {} against {} (winner: {:?})",
            prepared.request.action,
            prepared.request.attacker,
            prepared.request.defender,
            resolution.winner
        );

        match self.dispatch_resolution(&mut resolution).await {
            Ok(dispatched) => {
                if dispatched.failures > 0 {
                    warn!(
                        "sequence {} dispatched with {} fan-out failures",
                        dispatched.sequence, dispatched.failures
                    );
                }
                Ok(resolution)
            }
            Err(source) => {
                error!("committed resolution was not dispatched: {}", source);
                Err(CombatError::Undispatched {
                    resolution: Box::new(resolution),
                    source,
                })
            }
        }
    }

    /// Sequences, persists and fans out the events of a committed resolution,
    /// stamping the shared sequence on both.
    ///
    /// Accounts are not touched, so this is how a resolution returned in
    /// [`CombatError::Undispatched`] is finished.
    pub async fn dispatch_resolution(
        &self,
        resolution: &mut Resolution,
    ) -> std::result::Result<Dispatched, DispatchError> {
        let events = vec![
            resolution.attacker_event.clone(),
            resolution.defender_event.clone(),
        ];
        let dispatched = self.dispatcher.dispatch(events).await?;
        resolution.attacker_event.sequence = dispatched.sequence;
        resolution.defender_event.sequence = dispatched.sequence;
        Ok(dispatched)
    }

    /// Schedules purges for sides holding expired units once the engagement
    /// settles without a commit. A committed resolution has already dropped
    /// them, and the worker must not commit either account while the
    /// resolution is pending.
    fn spawn_cleanup(
        &self,
        attacker: &AccountState,
        defender: &AccountState,
        now: DateTime<Utc>,
        settled: oneshot::Receiver<bool>,
    ) -> JoinHandle<usize> {
        let expired: Vec<IdentityId> = [attacker, defender]
            .into_iter()
            .filter(|account| account.has_expired_units(now))
            .map(|account| account.identity)
            .collect();
        let queue = Arc::clone(&self.queue);

        tokio::spawn(async move {
            if expired.is_empty() || settled.await.unwrap_or(false) {
                return 0;
            }
            let mut scheduled = 0;
            for identity in expired {
                match queue.enqueue(Task::PurgeExpired { identity }) {
                    Ok(()) => scheduled += 1,
                    Err(e) => warn!("could not schedule purge for {}: {}", identity, e),
                }
            }
            scheduled
        })
    }
}

/// Builder for [`CombatService`].
///
/// Accounts, the event repository and the task queue are required; every
/// other store falls back to an in-memory implementation.
pub struct CombatServiceBuilder {
    config: RuntimeConfig,
    accounts: Option<Arc<dyn AccountStore>>,
    events: Option<Arc<dyn EventRepository>>,
    queue: Option<Arc<dyn TaskQueue>>,
    counter_store: Option<Arc<dyn CounterStore>>,
    trackers: Option<Arc<dyn TrackerStore>>,
    subscriptions: Option<Arc<dyn SubscriptionDirectory>>,
    wars: Option<Arc<dyn WarDirectory>>,
    bus: Option<EventBus>,
}

impl CombatServiceBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            accounts: None,
            events: None,
            queue: None,
            counter_store: None,
            trackers: None,
            subscriptions: None,
            wars: None,
            bus: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn accounts(mut self, accounts: Arc<dyn AccountStore>) -> Self {
        self.accounts = Some(accounts);
        self
    }

    pub fn events(mut self, events: Arc<dyn EventRepository>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn queue(mut self, queue: Arc<dyn TaskQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn counter_store(mut self, store: Arc<dyn CounterStore>) -> Self {
        self.counter_store = Some(store);
        self
    }

    pub fn trackers(mut self, trackers: Arc<dyn TrackerStore>) -> Self {
        self.trackers = Some(trackers);
        self
    }

    pub fn subscriptions(mut self, subscriptions: Arc<dyn SubscriptionDirectory>) -> Self {
        self.subscriptions = Some(subscriptions);
        self
    }

    pub fn wars(mut self, wars: Arc<dyn WarDirectory>) -> Self {
        self.wars = Some(wars);
        self
    }

    /// Share an existing bus, e.g. the one the notification worker publishes to.
    pub fn bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn build(self) -> Result<CombatService> {
        let accounts = self
            .accounts
            .ok_or_else(|| CombatError::MissingComponent("accounts"))?;
        let events = self
            .events
            .ok_or_else(|| CombatError::MissingComponent("events"))?;
        let queue = self
            .queue
            .ok_or_else(|| CombatError::MissingComponent("queue"))?;

        let counter_store = self
            .counter_store
            .unwrap_or_else(|| Arc::new(InMemoryCounterStore::new()));
        let trackers = self
            .trackers
            .unwrap_or_else(|| Arc::new(InMemoryTrackerStore::new()));
        let subscriptions = self
            .subscriptions
            .unwrap_or_else(|| Arc::new(InMemorySubscriptions::new()));
        let wars = self
            .wars
            .unwrap_or_else(|| Arc::new(InMemoryWarDirectory::new()));
        let bus = self
            .bus
            .unwrap_or_else(|| EventBus::with_capacity(self.config.dispatch.event_buffer));

        let counter = Arc::new(ShardedCounter::new(
            counter_store,
            self.config.counter.shards,
        ));
        let dispatcher = EventDispatcher::new(
            counter,
            events,
            trackers,
            subscriptions,
            Arc::clone(&queue),
            bus,
            self.config.counter.sequence_name.clone(),
        );

        Ok(CombatService {
            config: self.config,
            accounts,
            wars,
            queue,
            dispatcher,
        })
    }
}
