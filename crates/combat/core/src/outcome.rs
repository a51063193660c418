//! Winner decision and score deltas.
//!
//! # Formulas
//!
//! ```text
//! diff_loss = defender_bandwidth_lost - attacker_bandwidth_lost
//! threshold = attacker_bandwidth_lost * victory_threshold
//! defender wins if diff_loss <= 0 or diff_loss <= threshold
//!
//! hardpoints  = (sqrt(bandwidth_killed) + 200) / 200
//! pct_killed  = bandwidth_killed / defender_usage_before * 100
//! clan_points = floor(((min(pct_killed, 10) / 2) + (min(hardpoints, 10) / 2)) / war_multiplier)
//! ```

use serde::{Deserialize, Serialize};

use crate::account::Side;
use crate::battle::Ledger;
use crate::config::BalanceConfig;

/// War connection between two clans.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarStatus {
    #[default]
    None,
    /// One clan declared on the other.
    OneSided,
    /// Both clans declared on each other.
    Mutual,
}

impl WarStatus {
    /// Folds the two directional declarations into a status.
    pub const fn from_declarations(forward: bool, backward: bool) -> Self {
        match (forward, backward) {
            (true, true) => Self::Mutual,
            (true, false) | (false, true) => Self::OneSided,
            (false, false) => Self::None,
        }
    }

    pub const fn is_active(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Divisor applied to clan points; `None` outside of war.
    pub const fn multiplier(self) -> Option<f64> {
        match self {
            Self::None => None,
            Self::OneSided => Some(1.0),
            Self::Mutual => Some(2.0),
        }
    }
}

/// Decides which side won an attack from the bandwidth each side lost.
pub fn decide_winner(ledger: &Ledger, balance: &BalanceConfig) -> Side {
    let attacker_lost = ledger.attacker.bandwidth_lost;
    let diff_loss = ledger.defender.bandwidth_lost - attacker_lost;
    let threshold = attacker_lost as f64 * balance.victory_threshold;

    if diff_loss <= 0 || diff_loss as f64 <= threshold {
        Side::Defender
    } else {
        Side::Attacker
    }
}

/// Cycles a winning attacker takes from the defender.
pub fn cycles_stolen(defender_cycles: i64, balance: &BalanceConfig) -> i64 {
    if defender_cycles <= 0 {
        return 0;
    }
    (defender_cycles as f64 * balance.cycle_theft).floor() as i64
}

/// Clan points earned by a winning attacker during a war.
pub fn clan_points(
    bandwidth_killed: i64,
    defender_usage_before: i64,
    war: WarStatus,
    balance: &BalanceConfig,
) -> i64 {
    let Some(multiplier) = war.multiplier() else {
        return 0;
    };
    let killed = bandwidth_killed.max(0) as f64;

    let pct_killed = if defender_usage_before > 0 {
        killed / defender_usage_before as f64 * 100.0
    } else {
        0.0
    };
    let hardpoints = (killed.sqrt() + balance.hardpoint_offset) / balance.hardpoint_divisor;

    let points = ((pct_killed.min(balance.clan_point_cap) / 2.0)
        + (hardpoints.min(balance.clan_point_cap) / 2.0))
        / multiplier;
    points.floor() as i64
}

/// Score changes of one attack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Award {
    pub attacker_points: i64,
    pub defender_points: i64,
    pub cycles_stolen: i64,
    pub clan_points: i64,
}

/// Winner and awards of an attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub winner: Side,
    pub award: Award,
}

impl Outcome {
    /// Scores a rendered attack.
    pub fn score(
        ledger: &Ledger,
        defender_cycles: i64,
        defender_usage_before: i64,
        war: WarStatus,
        balance: &BalanceConfig,
    ) -> Self {
        let winner = decide_winner(ledger, balance);
        let award = match winner {
            Side::Defender => Award {
                defender_points: 1,
                ..Award::default()
            },
            Side::Attacker => Award {
                attacker_points: 1,
                cycles_stolen: cycles_stolen(defender_cycles, balance),
                clan_points: clan_points(
                    ledger.attacker.bandwidth_killed,
                    defender_usage_before,
                    war,
                    balance,
                ),
                ..Award::default()
            },
        };
        Self { winner, award }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::SideTally;

    fn ledger(attacker_lost: i64, defender_lost: i64) -> Ledger {
        Ledger {
            attacker: SideTally {
                bandwidth_lost: attacker_lost,
                bandwidth_killed: defender_lost,
                ..SideTally::default()
            },
            defender: SideTally {
                bandwidth_lost: defender_lost,
                bandwidth_killed: attacker_lost,
                ..SideTally::default()
            },
        }
    }

    #[test]
    fn attacker_wins_clear_margin() {
        let balance = BalanceConfig::default();
        let outcome = Outcome::score(&ledger(100, 200), 1_005, 0, WarStatus::None, &balance);

        assert_eq!(outcome.winner, Side::Attacker);
        assert_eq!(outcome.award.attacker_points, 1);
        assert_eq!(outcome.award.defender_points, 0);
        assert_eq!(outcome.award.cycles_stolen, 100);
        assert_eq!(outcome.award.clan_points, 0);
    }

    #[test]
    fn threshold_favours_defender() {
        let balance = BalanceConfig::default();
        let outcome = Outcome::score(&ledger(100, 105), 1_000, 0, WarStatus::Mutual, &balance);

        assert_eq!(outcome.winner, Side::Defender);
        assert_eq!(outcome.award.defender_points, 1);
        assert_eq!(outcome.award.cycles_stolen, 0);
        assert_eq!(outcome.award.clan_points, 0);
    }

    #[test]
    fn equal_or_no_losses_go_to_defender() {
        let balance = BalanceConfig::default();
        assert_eq!(decide_winner(&ledger(0, 0), &balance), Side::Defender);
        assert_eq!(decide_winner(&ledger(50, 50), &balance), Side::Defender);
        assert_eq!(decide_winner(&ledger(0, 1), &balance), Side::Attacker);
    }

    #[test]
    fn clan_points_depend_on_war_multiplier() {
        let balance = BalanceConfig::default();
        // pct = 40 capped at 10 -> 5; hardpoints = 220 / 200 = 1.1 -> 0.55
        assert_eq!(clan_points(400, 1_000, WarStatus::OneSided, &balance), 5);
        assert_eq!(clan_points(400, 1_000, WarStatus::Mutual, &balance), 2);
        assert_eq!(clan_points(400, 1_000, WarStatus::None, &balance), 0);
        // no usage before the attack: only hardpoints count
        assert_eq!(clan_points(400, 0, WarStatus::OneSided, &balance), 0);
    }

    #[test]
    fn war_status_from_declarations() {
        assert_eq!(WarStatus::from_declarations(true, true), WarStatus::Mutual);
        assert_eq!(WarStatus::from_declarations(false, true), WarStatus::OneSided);
        assert_eq!(WarStatus::from_declarations(false, false), WarStatus::None);
        assert!(!WarStatus::None.is_active());
    }

    #[test]
    fn no_theft_from_empty_pool() {
        let balance = BalanceConfig::default();
        assert_eq!(cycles_stolen(0, &balance), 0);
        assert_eq!(cycles_stolen(9, &balance), 0);
        assert_eq!(cycles_stolen(10, &balance), 1);
    }
}
