//! Durable records of a resolution, one per side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::account::{ClanId, IdentityId, Side};
use crate::action::ActionKind;
use crate::battle::{CombatParticipant, SideTally};
use crate::category::UnitCategory;
use crate::outcome::WarStatus;
use crate::units::{UnitId, UnitSnapshot};

/// Sequence number shared by the two events of one resolution.
pub type Sequence = u64;

/// Role of the event owner in the engagement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Attacker,
    Defender,
}

impl From<Side> for Role {
    fn from(side: Side) -> Self {
        match side {
            Side::Attacker => Self::Attacker,
            Side::Defender => Self::Defender,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum BattleResult {
    Won,
    Lost,
}

/// Per-stack loss line of an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitLoss {
    pub unit: UnitId,
    pub name: String,
    pub category: UnitCategory,
    pub amount_before: i64,
    pub lost: i64,
}

impl From<&CombatParticipant> for UnitLoss {
    fn from(participant: &CombatParticipant) -> Self {
        Self {
            unit: participant.unit,
            name: participant.name.clone(),
            category: participant.category,
            amount_before: participant.amount_before,
            lost: participant.lost(),
        }
    }
}

/// War bookkeeping attached to events between warring clans.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarReference {
    pub attacker_clan: ClanId,
    pub defender_clan: ClanId,
    pub status: WarStatus,
}

/// One side's view of a resolved engagement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Zero until the dispatcher assigns the shared sequence.
    pub sequence: Sequence,
    pub owner: IdentityId,
    pub counterpart: IdentityId,
    pub owner_clan: Option<ClanId>,
    pub action: ActionKind,
    pub role: Role,
    pub result: BattleResult,
    pub bandwidth_lost: i64,
    pub bandwidth_killed: i64,
    pub units_lost: i64,
    pub units_killed: i64,
    pub yield_lost: i64,
    /// Cycles gained (positive) or stolen from the owner (negative).
    pub cycles_delta: i64,
    pub points_gained: i64,
    pub clan_points_gained: i64,
    pub memory_spent: i64,
    pub war: Option<WarReference>,
    pub breakdown: Vec<UnitLoss>,
    /// Defender inventory revealed by a successful spy.
    pub intel: Option<Vec<UnitSnapshot>>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// The attacking identity, whichever side owns this record.
    pub fn actor(&self) -> IdentityId {
        match self.role {
            Role::Attacker => self.owner,
            Role::Defender => self.counterpart,
        }
    }

    pub fn won(&self) -> bool {
        self.result == BattleResult::Won
    }

    pub(crate) fn apply_tally(&mut self, tally: &SideTally) {
        self.bandwidth_lost = tally.bandwidth_lost;
        self.bandwidth_killed = tally.bandwidth_killed;
        self.units_lost = tally.units_lost;
        self.units_killed = tally.units_killed;
        self.yield_lost = tally.yield_lost;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(role: Role) -> Event {
        Event {
            sequence: 0,
            owner: IdentityId(5),
            counterpart: IdentityId(9),
            owner_clan: None,
            action: ActionKind::Attack,
            role,
            result: BattleResult::Lost,
            bandwidth_lost: 0,
            bandwidth_killed: 0,
            units_lost: 0,
            units_killed: 0,
            yield_lost: 0,
            cycles_delta: 0,
            points_gained: 0,
            clan_points_gained: 0,
            memory_spent: 0,
            war: None,
            breakdown: Vec::new(),
            intel: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn actor_is_always_the_attacker() {
        assert_eq!(event(Role::Attacker).actor(), IdentityId(5));
        assert_eq!(event(Role::Defender).actor(), IdentityId(9));
    }
}
