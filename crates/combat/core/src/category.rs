//! Unit categories and category sets.
//!
//! A unit belongs to exactly one [`UnitCategory`] but can affect several,
//! described by its [`Categories`] effector set. Pairing and defense checks are
//! expressed as set membership against these types instead of raw bit masks.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// Single classification of a unit.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, Serialize, Deserialize,
)]
pub enum UnitCategory {
    Swarm,
    Mutator,
    HunterKiller,
    Denial,
    Firewall,
    /// Produces bandwidth instead of consuming it.
    Connection,
    Intelligence,
    Ice,
    Infect,
}

impl UnitCategory {
    /// Returns the one-member set for this category.
    pub const fn as_set(self) -> Categories {
        match self {
            Self::Swarm => Categories::SWARM,
            Self::Mutator => Categories::MUTATOR,
            Self::HunterKiller => Categories::HUNTER_KILLER,
            Self::Denial => Categories::DENIAL,
            Self::Firewall => Categories::FIREWALL,
            Self::Connection => Categories::CONNECTION,
            Self::Intelligence => Categories::INTELLIGENCE,
            Self::Ice => Categories::ICE,
            Self::Infect => Categories::INFECT,
        }
    }

    /// Whether units of this category contribute yield rather than usage.
    pub const fn produces_yield(self) -> bool {
        matches!(self, Self::Connection)
    }

    /// Concentrated attacks ignore partial passive defense.
    pub const fn is_concentrated(self) -> bool {
        matches!(self, Self::HunterKiller)
    }
}

bitflags! {
    /// Set of unit categories, used for effector lists and membership tests.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Categories: u16 {
        const SWARM         = 1 << 0;
        const MUTATOR       = 1 << 1;
        const HUNTER_KILLER = 1 << 2;
        const DENIAL        = 1 << 3;
        const FIREWALL      = 1 << 4;
        const CONNECTION    = 1 << 5;
        const INTELLIGENCE  = 1 << 6;
        const ICE           = 1 << 7;
        const INFECT        = 1 << 8;

        const OFFENSIVE = Self::SWARM.bits()
            | Self::MUTATOR.bits()
            | Self::HUNTER_KILLER.bits()
            | Self::DENIAL.bits();
    }
}

impl Categories {
    /// Returns true if `category` is a member of this set.
    pub const fn has(self, category: UnitCategory) -> bool {
        self.contains(category.as_set())
    }

    /// Number of distinct categories in the set.
    pub const fn count(self) -> usize {
        self.bits().count_ones() as usize
    }

    /// Iterates the member categories in declaration order.
    pub fn members(self) -> impl Iterator<Item = UnitCategory> {
        UnitCategory::iter().filter(move |category| self.has(*category))
    }
}

impl From<UnitCategory> for Categories {
    fn from(category: UnitCategory) -> Self {
        category.as_set()
    }
}

impl FromIterator<UnitCategory> for Categories {
    fn from_iter<I: IntoIterator<Item = UnitCategory>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Categories::empty(), |set, category| set | category.as_set())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_maps_to_a_single_bit() {
        for category in UnitCategory::iter() {
            assert_eq!(category.as_set().count(), 1, "{category}");
        }
    }

    #[test]
    fn offensive_set_holds_attack_categories_only() {
        let offensive = Categories::OFFENSIVE;
        assert_eq!(offensive.count(), 4);
        assert!(offensive.has(UnitCategory::HunterKiller));
        assert!(!offensive.has(UnitCategory::Firewall));
        assert!(!offensive.has(UnitCategory::Intelligence));
    }

    #[test]
    fn members_and_collect_agree() {
        let set: Categories = [UnitCategory::Ice, UnitCategory::Swarm].into_iter().collect();
        let members: Vec<_> = set.members().collect();
        assert_eq!(members, vec![UnitCategory::Swarm, UnitCategory::Ice]);
        assert!(set.intersects(UnitCategory::Ice.as_set()));
        assert!(!set.intersects(Categories::CONNECTION));
    }
}
