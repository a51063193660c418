//! Resource pools owned by an identity.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// Individual resource pools, used for error reporting and lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum ResourceKind {
    Cycles,
    Memory,
    ActiveMemory,
    Bandwidth,
    BandwidthUsage,
    AttackPoints,
    ClanPoints,
}

/// Every spendable and rating pool of one account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePools {
    /// Currency spent to acquire units.
    pub cycles: i64,
    /// Total memory capacity.
    pub memory: i64,
    /// Memory held by running units.
    pub active_memory: i64,
    /// Bandwidth yield.
    pub bandwidth: i64,
    /// Bandwidth consumed by owned units.
    pub bandwidth_usage: i64,
    pub attack_points: i64,
    pub clan_points: i64,
}

impl ResourcePools {
    /// Memory still available for running more units.
    pub fn free_memory(&self) -> i64 {
        self.memory - self.active_memory
    }

    pub fn get(&self, kind: ResourceKind) -> i64 {
        match kind {
            ResourceKind::Cycles => self.cycles,
            ResourceKind::Memory => self.memory,
            ResourceKind::ActiveMemory => self.active_memory,
            ResourceKind::Bandwidth => self.bandwidth,
            ResourceKind::BandwidthUsage => self.bandwidth_usage,
            ResourceKind::AttackPoints => self.attack_points,
            ResourceKind::ClanPoints => self.clan_points,
        }
    }

    /// Returns the first pool that dropped below zero, if any.
    pub fn first_negative(&self) -> Option<(ResourceKind, i64)> {
        ResourceKind::iter()
            .map(|kind| (kind, self.get(kind)))
            .find(|(_, value)| *value < 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_negative_reports_offending_pool() {
        let mut pools = ResourcePools {
            cycles: 10,
            memory: 5,
            ..Default::default()
        };
        assert_eq!(pools.first_negative(), None);

        pools.bandwidth_usage = -3;
        assert_eq!(
            pools.first_negative(),
            Some((ResourceKind::BandwidthUsage, -3))
        );
    }

    #[test]
    fn free_memory_subtracts_active() {
        let pools = ResourcePools {
            memory: 100,
            active_memory: 30,
            ..Default::default()
        };
        assert_eq!(pools.free_memory(), 70);
    }
}
