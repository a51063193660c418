//! Demo world: two clans at war and three players.

use std::sync::Arc;

use combat_core::{
    AccountState, ActionKind, Categories, ClanId, IdentityId, OwnedUnit, OwnedUnitGroup,
    ResourcePools, UnitCategory, UnitId, UnitSpec,
};
use combat_runtime::repository::Result;
use combat_runtime::{
    Channel, InMemoryAccountStore, InMemorySubscriptions, InMemoryTrackerStore,
    InMemoryWarDirectory,
};

pub const RAIDER: IdentityId = IdentityId(1);
pub const KEEPER: IdentityId = IdentityId(2);
pub const SCOUT: IdentityId = IdentityId(3);
/// Keeper's clanmate without an account of its own.
pub const WARDEN: IdentityId = IdentityId(4);

pub const RED: ClanId = ClanId(1);
pub const BLUE: ClanId = ClanId(2);

pub const WORMS: UnitId = UnitId(1);
pub const PROBES: UnitId = UnitId(2);
pub const LEECHES: UnitId = UnitId(3);

/// Directories the service is wired with.
pub struct World {
    pub trackers: Arc<InMemoryTrackerStore>,
    pub subscriptions: Arc<InMemorySubscriptions>,
    pub wars: Arc<InMemoryWarDirectory>,
}

pub fn seed(accounts: &InMemoryAccountStore) -> Result<World> {
    accounts.insert(raider())?;
    accounts.insert(keeper())?;
    accounts.insert(scout())?;

    let trackers = Arc::new(InMemoryTrackerStore::new());
    for (clan, member) in [(RED, RAIDER), (RED, SCOUT), (BLUE, KEEPER), (BLUE, WARDEN)] {
        trackers.join_clan(clan, member)?;
    }

    let wars = Arc::new(InMemoryWarDirectory::new());
    wars.declare(RED, BLUE)?;
    wars.declare(BLUE, RED)?;

    let subscriptions = Arc::new(InMemorySubscriptions::new());
    subscriptions.subscribe(KEEPER, ActionKind::Attack, Channel::Email)?;
    subscriptions.subscribe(KEEPER, ActionKind::Attack, Channel::Push)?;
    subscriptions.subscribe(KEEPER, ActionKind::Spy, Channel::Push)?;
    subscriptions.subscribe(KEEPER, ActionKind::Infiltrate, Channel::Email)?;
    subscriptions.subscribe(RAIDER, ActionKind::Attack, Channel::Push)?;
    subscriptions.subscribe(WARDEN, ActionKind::Attack, Channel::Email)?;

    Ok(World {
        trackers,
        subscriptions,
        wars,
    })
}

fn unit(
    id: UnitId,
    name: &str,
    category: UnitCategory,
    effectors: Categories,
    (attack, life, bandwidth, memory): (i64, i64, i64, i64),
    amount: i64,
) -> OwnedUnit {
    let spec = UnitSpec {
        name: name.into(),
        category,
        effectors,
        attack,
        life,
        bandwidth,
        memory,
    };
    OwnedUnit::new(id, spec, amount)
}

fn raider() -> AccountState {
    let pools = ResourcePools {
        cycles: 500,
        memory: 100,
        active_memory: 20,
        bandwidth: 100,
        bandwidth_usage: 40,
        ..Default::default()
    };
    AccountState::new(RAIDER, pools)
        .with_clan(RED)
        .with_group(OwnedUnitGroup::new(
            UnitCategory::Swarm,
            100,
            40,
            vec![unit(
                WORMS,
                "worm",
                UnitCategory::Swarm,
                Categories::FIREWALL,
                (10, 10, 2, 1),
                20,
            )],
        ))
}

fn keeper() -> AccountState {
    let pools = ResourcePools {
        cycles: 1_000,
        memory: 50,
        bandwidth: 200,
        bandwidth_usage: 150,
        ..Default::default()
    };
    AccountState::new(KEEPER, pools)
        .with_clan(BLUE)
        .with_group(OwnedUnitGroup::new(
            UnitCategory::Firewall,
            200,
            150,
            vec![unit(
                UnitId(1),
                "wall",
                UnitCategory::Firewall,
                Categories::SWARM,
                (4, 10, 5, 0),
                30,
            )],
        ))
}

fn scout() -> AccountState {
    let pools = ResourcePools {
        memory: 10,
        bandwidth: 100,
        bandwidth_usage: 12,
        ..Default::default()
    };
    AccountState::new(SCOUT, pools)
        .with_clan(RED)
        .with_group(OwnedUnitGroup::new(
            UnitCategory::Intelligence,
            10,
            0,
            vec![unit(
                PROBES,
                "probe",
                UnitCategory::Intelligence,
                Categories::ICE,
                (1, 10, 0, 0),
                5,
            )],
        ))
        .with_group(OwnedUnitGroup::new(
            UnitCategory::Infect,
            100,
            12,
            vec![unit(
                LEECHES,
                "leech",
                UnitCategory::Infect,
                Categories::empty(),
                (0, 5, 3, 0),
                4,
            )],
        ))
}
