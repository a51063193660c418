//! Account state as loaded from and committed to storage.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::UnitCategory;
use crate::error::ResourceExhausted;
use crate::resources::ResourcePools;
use crate::units::{OwnedUnit, OwnedUnitGroup, UnitId, UnitRef, UnitSnapshot};

/// Opaque reference to a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityId(pub u64);

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// Opaque reference to a clan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClanId(pub u64);

impl fmt::Display for ClanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clan#{}", self.0)
    }
}

/// Side of an engagement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    pub const fn opponent(self) -> Self {
        match self {
            Self::Attacker => Self::Defender,
            Self::Defender => Self::Attacker,
        }
    }
}

/// Pools and unit inventory of one identity.
///
/// `version` is the optimistic-concurrency token handed out by the store; a
/// commit carrying a stale version is rejected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub identity: IdentityId,
    pub clan: Option<ClanId>,
    pub version: u64,
    pub pools: ResourcePools,
    pub groups: Vec<OwnedUnitGroup>,
}

impl AccountState {
    pub fn new(identity: IdentityId, pools: ResourcePools) -> Self {
        Self {
            identity,
            clan: None,
            version: 0,
            pools,
            groups: Vec::new(),
        }
    }

    pub fn with_clan(mut self, clan: ClanId) -> Self {
        self.clan = Some(clan);
        self
    }

    pub fn with_group(mut self, group: OwnedUnitGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn find_unit(&self, id: UnitId) -> Option<UnitRef> {
        self.groups.iter().enumerate().find_map(|(group, g)| {
            g.units
                .iter()
                .position(|unit| unit.id == id)
                .map(|unit| UnitRef { group, unit })
        })
    }

    pub fn unit(&self, at: UnitRef) -> Option<&OwnedUnit> {
        self.groups.get(at.group)?.units.get(at.unit)
    }

    pub fn group(&self, category: UnitCategory) -> Option<&OwnedUnitGroup> {
        self.groups.iter().find(|group| group.category == category)
    }

    /// Returns the group for `category`, creating an empty one if needed.
    pub fn group_mut(&mut self, category: UnitCategory) -> &mut OwnedUnitGroup {
        let index = match self.groups.iter().position(|g| g.category == category) {
            Some(index) => index,
            None => {
                self.groups
                    .push(OwnedUnitGroup::new(category, 0, 0, Vec::new()));
                self.groups.len() - 1
            }
        };
        &mut self.groups[index]
    }

    pub fn units(&self) -> impl Iterator<Item = &OwnedUnit> {
        self.groups.iter().flat_map(|group| group.units.iter())
    }

    pub fn next_unit_id(&self) -> UnitId {
        UnitId(self.units().map(|unit| unit.id.0).max().unwrap_or(0) + 1)
    }

    pub fn has_expired_units(&self, now: DateTime<Utc>) -> bool {
        self.units().any(|unit| unit.is_expired(now))
    }

    /// Removes `lost` units from the stack at `at`, releasing the bandwidth,
    /// yield and active memory they held.
    pub fn remove_units(&mut self, at: UnitRef, lost: i64) {
        let Some(group) = self.groups.get_mut(at.group) else {
            return;
        };
        let Some(unit) = group.units.get_mut(at.unit) else {
            return;
        };

        let lost = lost.min(unit.amount).max(0);
        unit.amount -= lost;

        let bandwidth = lost * unit.spec.bandwidth;
        if unit.spec.category.produces_yield() {
            group.yield_total -= bandwidth;
            self.pools.bandwidth -= bandwidth;
        } else {
            group.usage -= bandwidth;
            self.pools.bandwidth_usage -= bandwidth;
        }
        if unit.active {
            self.pools.active_memory -= lost * unit.spec.memory;
        }
    }

    /// Drops empty stacks and recomputes every group's powered flag.
    pub fn settle(&mut self) {
        for group in &mut self.groups {
            group.units.retain(|unit| unit.amount > 0);
            group.refresh();
        }
    }

    /// Removes expired units, returning what was removed.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> Vec<OwnedUnit> {
        let removed = self.drop_expired(now);
        self.settle();
        removed
    }

    /// Zeroes expired stacks without settling, so existing [`UnitRef`]s stay
    /// valid until the next [`AccountState::settle`].
    pub(crate) fn drop_expired(&mut self, now: DateTime<Utc>) -> Vec<OwnedUnit> {
        let expired: Vec<UnitRef> = self
            .groups
            .iter()
            .enumerate()
            .flat_map(|(group, g)| {
                g.units
                    .iter()
                    .enumerate()
                    .filter(|(_, unit)| unit.is_expired(now))
                    .map(move |(unit, _)| UnitRef { group, unit })
            })
            .collect();

        let mut removed = Vec::with_capacity(expired.len());
        for at in expired {
            if let Some(unit) = self.unit(at).cloned() {
                self.remove_units(at, unit.amount);
                removed.push(unit);
            }
        }
        removed
    }

    pub fn snapshot(&self) -> Vec<UnitSnapshot> {
        self.units().map(OwnedUnit::snapshot).collect()
    }

    /// Fails with the first pool that ended below zero.
    pub fn ensure_non_negative(&self) -> Result<(), ResourceExhausted> {
        match self.pools.first_negative() {
            Some((resource, value)) => Err(ResourceExhausted {
                identity: self.identity,
                resource,
                value,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Categories;
    use crate::units::UnitSpec;
    use chrono::Duration;

    fn infection() -> UnitSpec {
        UnitSpec {
            name: "leech".into(),
            category: UnitCategory::Infect,
            effectors: Categories::empty(),
            attack: 0,
            life: 5,
            bandwidth: 3,
            memory: 0,
        }
    }

    #[test]
    fn purge_releases_bandwidth_of_expired_units() {
        let now = Utc::now();
        let pools = ResourcePools {
            bandwidth: 100,
            bandwidth_usage: 30,
            ..Default::default()
        };
        let expired = OwnedUnit::new(UnitId(1), infection(), 4).expiring_at(now - Duration::hours(1));
        let fresh = OwnedUnit::new(UnitId(2), infection(), 2).expiring_at(now + Duration::hours(1));
        let mut account = AccountState::new(IdentityId(7), pools).with_group(OwnedUnitGroup::new(
            UnitCategory::Infect,
            0,
            18,
            vec![expired, fresh],
        ));

        assert!(account.has_expired_units(now));
        let removed = account.purge_expired(now);

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, UnitId(1));
        assert_eq!(account.pools.bandwidth_usage, 18);
        assert_eq!(account.groups[0].usage, 6);
        assert_eq!(account.groups[0].units.len(), 1);
        assert!(!account.has_expired_units(now));
    }

    #[test]
    fn next_unit_id_follows_highest() {
        let account = AccountState::new(IdentityId(1), ResourcePools::default()).with_group(
            OwnedUnitGroup::new(
                UnitCategory::Infect,
                0,
                0,
                vec![OwnedUnit::new(UnitId(9), infection(), 1)],
            ),
        );
        assert_eq!(account.next_unit_id(), UnitId(10));
    }
}
