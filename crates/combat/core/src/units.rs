//! Owned units and their per-category groups.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::{Categories, UnitCategory};

/// Identifier of one owned unit stack within an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// Catalog data shared by every unit of one program type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    pub name: String,
    pub category: UnitCategory,
    /// Categories this unit can damage.
    pub effectors: Categories,
    pub attack: i64,
    pub life: i64,
    /// Bandwidth consumed per unit, or produced for yield categories.
    pub bandwidth: i64,
    /// Memory required to run one unit in an engagement.
    pub memory: i64,
}

/// A stack of identical units owned by one account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OwnedUnit {
    pub id: UnitId,
    pub spec: UnitSpec,
    pub amount: i64,
    pub active: bool,
    /// Time-limited units (infections) disappear after this instant.
    pub expires_at: Option<DateTime<Utc>>,
}

impl OwnedUnit {
    pub fn new(id: UnitId, spec: UnitSpec, amount: i64) -> Self {
        Self {
            id,
            spec,
            amount,
            active: true,
            expires_at: None,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn expiring_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Bandwidth this stack consumes (or yields) in total.
    pub fn total_bandwidth(&self) -> i64 {
        self.amount * self.spec.bandwidth
    }

    pub fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            unit: self.id,
            name: self.spec.name.clone(),
            category: self.spec.category,
            amount: self.amount,
            active: self.active,
        }
    }
}

/// Position of a unit inside an account's group list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UnitRef {
    pub group: usize,
    pub unit: usize,
}

/// All units of one category with the category's bandwidth budget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OwnedUnitGroup {
    pub category: UnitCategory,
    /// Bandwidth capacity available to this category.
    pub yield_total: i64,
    /// Bandwidth consumed by this category.
    pub usage: i64,
    powered: bool,
    pub units: Vec<OwnedUnit>,
}

impl OwnedUnitGroup {
    pub fn new(category: UnitCategory, yield_total: i64, usage: i64, units: Vec<OwnedUnit>) -> Self {
        let mut group = Self {
            category,
            yield_total,
            usage,
            powered: false,
            units,
        };
        group.refresh();
        group
    }

    /// Powered only while capacity strictly exceeds consumption.
    pub fn is_powered(&self) -> bool {
        self.powered
    }

    /// Recomputes the derived `powered` flag after yield or usage changed.
    pub fn refresh(&mut self) {
        self.powered = self.yield_total > self.usage;
    }

    pub fn unit(&self, id: UnitId) -> Option<&OwnedUnit> {
        self.units.iter().find(|unit| unit.id == id)
    }
}

/// Read-only view of a unit, attached to spy reports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub unit: UnitId,
    pub name: String,
    pub category: UnitCategory,
    pub amount: i64,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn spec() -> UnitSpec {
        UnitSpec {
            name: "worm".into(),
            category: UnitCategory::Swarm,
            effectors: Categories::FIREWALL,
            attack: 4,
            life: 10,
            bandwidth: 2,
            memory: 1,
        }
    }

    #[test]
    fn powered_requires_strict_surplus() {
        let mut group = OwnedUnitGroup::new(UnitCategory::Swarm, 10, 10, vec![]);
        assert!(!group.is_powered());

        group.yield_total = 11;
        assert!(!group.is_powered(), "flag only changes on refresh");
        group.refresh();
        assert!(group.is_powered());
    }

    #[test]
    fn expiry_is_inclusive() {
        let now = Utc::now();
        let unit = OwnedUnit::new(UnitId(1), spec(), 3).expiring_at(now);
        assert!(unit.is_expired(now));
        assert!(!unit.is_expired(now - Duration::seconds(1)));
        assert!(!OwnedUnit::new(UnitId(2), spec(), 3).is_expired(now));
    }
}
