//! Combat requests and their validation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::account::{AccountState, IdentityId};
use crate::category::Categories;
use crate::error::ValidationError;
use crate::units::{UnitId, UnitRef};

/// The combat use cases.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    /// Full assault; the winner takes rating and cycles.
    Attack,
    /// Intelligence probe; success reveals the defender's inventory.
    Spy,
    /// Plants time-limited infections that drain defender bandwidth.
    Infiltrate,
}

impl ActionKind {
    /// Unit categories that may be committed to this action.
    pub const fn allowed_categories(self) -> Categories {
        match self {
            Self::Attack => Categories::OFFENSIVE,
            Self::Spy => Categories::INTELLIGENCE,
            Self::Infiltrate => Categories::INFECT,
        }
    }
}

/// Units the attacker sends into the engagement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub unit: UnitId,
    pub amount: i64,
}

impl Commitment {
    pub const fn new(unit: UnitId, amount: i64) -> Self {
        Self { unit, amount }
    }
}

/// A decoded, authenticated combat request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatRequest {
    pub action: ActionKind,
    pub attacker: IdentityId,
    pub defender: IdentityId,
    pub commitments: Vec<Commitment>,
}

/// A committed unit after validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommittedUnit {
    pub unit: UnitId,
    pub at: UnitRef,
    pub amount: i64,
}

/// A request whose commitments passed validation against the attacker's state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedEngagement {
    pub request: CombatRequest,
    pub committed: Vec<CommittedUnit>,
    /// Memory spent by the attacker regardless of outcome.
    pub memory_cost: i64,
}

impl CombatRequest {
    pub fn new(
        action: ActionKind,
        attacker: IdentityId,
        defender: IdentityId,
        commitments: Vec<Commitment>,
    ) -> Self {
        Self {
            action,
            attacker,
            defender,
            commitments,
        }
    }

    /// Checks that can run before any state is loaded.
    pub fn check_targets(&self) -> Result<(), ValidationError> {
        if self.attacker == self.defender {
            return Err(ValidationError::SelfTarget {
                identity: self.attacker,
            });
        }
        if self.commitments.is_empty() {
            return Err(ValidationError::EmptyCommitment);
        }
        Ok(())
    }

    /// Validates the commitments against the attacker's loaded state.
    ///
    /// Repeated commitments of one unit are merged before the owned amount is
    /// checked.
    pub fn prepare(
        &self,
        attacker: &AccountState,
        now: DateTime<Utc>,
    ) -> Result<PreparedEngagement, ValidationError> {
        self.check_targets()?;

        let mut merged: BTreeMap<UnitId, i64> = BTreeMap::new();
        for commitment in &self.commitments {
            if commitment.amount <= 0 {
                return Err(ValidationError::MalformedCommitment {
                    unit: commitment.unit,
                    amount: commitment.amount,
                });
            }
            *merged.entry(commitment.unit).or_default() += commitment.amount;
        }

        let allowed = self.action.allowed_categories();
        let mut committed = Vec::with_capacity(merged.len());
        let mut memory_cost = 0;

        for (unit_id, amount) in merged {
            let at = attacker
                .find_unit(unit_id)
                .ok_or(ValidationError::UnknownUnit {
                    identity: attacker.identity,
                    unit: unit_id,
                })?;
            let group = &attacker.groups[at.group];
            let unit = &group.units[at.unit];

            if !allowed.has(unit.spec.category) {
                return Err(ValidationError::CategoryNotAllowed {
                    unit: unit_id,
                    category: unit.spec.category,
                    action: self.action,
                });
            }
            if unit.is_expired(now) {
                return Err(ValidationError::ExpiredUnit { unit: unit_id });
            }
            if !unit.active {
                return Err(ValidationError::InactiveUnit { unit: unit_id });
            }
            if !group.is_powered() {
                return Err(ValidationError::Unpowered {
                    unit: unit_id,
                    category: group.category,
                });
            }
            if amount > unit.amount {
                return Err(ValidationError::OverCommitted {
                    unit: unit_id,
                    requested: amount,
                    available: unit.amount,
                });
            }

            memory_cost += amount * unit.spec.memory;
            committed.push(CommittedUnit {
                unit: unit_id,
                at,
                amount,
            });
        }

        let available = attacker.pools.free_memory();
        if memory_cost > available {
            return Err(ValidationError::InsufficientCapacity {
                required: memory_cost,
                available,
            });
        }

        Ok(PreparedEngagement {
            request: self.clone(),
            committed,
            memory_cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::UnitCategory;
    use crate::resources::ResourcePools;
    use crate::units::{OwnedUnit, OwnedUnitGroup, UnitSpec};

    fn swarm(memory: i64) -> UnitSpec {
        UnitSpec {
            name: "swarm".into(),
            category: UnitCategory::Swarm,
            effectors: Categories::FIREWALL,
            attack: 5,
            life: 10,
            bandwidth: 1,
            memory,
        }
    }

    fn attacker(free_memory: i64, powered: bool) -> AccountState {
        let pools = ResourcePools {
            memory: free_memory,
            ..Default::default()
        };
        let yield_total = if powered { 100 } else { 0 };
        AccountState::new(IdentityId(1), pools).with_group(OwnedUnitGroup::new(
            UnitCategory::Swarm,
            yield_total,
            10,
            vec![OwnedUnit::new(UnitId(1), swarm(2), 10)],
        ))
    }

    fn request(commitments: Vec<Commitment>) -> CombatRequest {
        CombatRequest::new(ActionKind::Attack, IdentityId(1), IdentityId(2), commitments)
    }

    #[test]
    fn self_target_is_rejected_before_loading() {
        let req = CombatRequest::new(
            ActionKind::Attack,
            IdentityId(3),
            IdentityId(3),
            vec![Commitment::new(UnitId(1), 1)],
        );
        assert_eq!(
            req.check_targets(),
            Err(ValidationError::SelfTarget {
                identity: IdentityId(3)
            })
        );
    }

    #[test]
    fn merged_commitments_cannot_exceed_owned_amount() {
        let req = request(vec![
            Commitment::new(UnitId(1), 6),
            Commitment::new(UnitId(1), 6),
        ]);
        let err = req.prepare(&attacker(1_000, true), Utc::now()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OverCommitted {
                unit: UnitId(1),
                requested: 12,
                available: 10
            }
        );
    }

    #[test]
    fn memory_cost_must_fit_free_capacity() {
        let req = request(vec![Commitment::new(UnitId(1), 10)]);
        let err = req.prepare(&attacker(19, true), Utc::now()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InsufficientCapacity {
                required: 20,
                available: 19
            }
        );

        let prepared = req.prepare(&attacker(20, true), Utc::now()).unwrap();
        assert_eq!(prepared.memory_cost, 20);
        assert_eq!(prepared.committed.len(), 1);
    }

    #[test]
    fn unpowered_group_cannot_commit() {
        let req = request(vec![Commitment::new(UnitId(1), 1)]);
        let err = req.prepare(&attacker(100, false), Utc::now()).unwrap_err();
        assert!(matches!(err, ValidationError::Unpowered { .. }));
    }

    #[test]
    fn wrong_category_for_action() {
        let req = CombatRequest::new(
            ActionKind::Spy,
            IdentityId(1),
            IdentityId(2),
            vec![Commitment::new(UnitId(1), 1)],
        );
        let err = req.prepare(&attacker(100, true), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::CategoryNotAllowed {
                category: UnitCategory::Swarm,
                action: ActionKind::Spy,
                ..
            }
        ));
    }
}
