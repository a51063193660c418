//! Converts aggregate damage into unit kills.
//!
//! # Formula
//!
//! ```text
//! multiplier = 1.0                  if the attack category is concentrated
//!            = active_defense (0.8) if the receiver defends against it
//!            = passive_defense (0.4) otherwise
//! killed     = floor(damage * multiplier / life), clamped to survivors
//! ```

use tracing::trace;

use super::participant::CombatParticipant;
use super::tally::Ledger;
use super::window::Matchup;
use crate::config::BalanceConfig;

/// Damage multiplier a receiver gets against `matchup.attack`.
pub fn defense_multiplier(
    receiver: &CombatParticipant,
    matchup: Matchup,
    balance: &BalanceConfig,
) -> f64 {
    if matchup.attack.is_concentrated() {
        balance.concentrated_defense
    } else if receiver.defends_against(matchup.attack) {
        balance.active_defense
    } else {
        balance.passive_defense
    }
}

/// Units killed by `adjusted` damage against `life`-point units, never more
/// than `remaining` and never negative.
pub fn kill_count(adjusted: f64, life: i64, remaining: i64) -> i64 {
    if life <= 0 || remaining <= 0 || adjusted.is_nan() || adjusted <= 0.0 {
        return 0;
    }
    let killed = (adjusted / life as f64).floor();
    if killed >= remaining as f64 {
        remaining
    } else {
        killed as i64
    }
}

/// Applies `damage` to one receiver and rolls the result into both tallies.
///
/// Returns the number of units killed.
pub fn apply(
    receiver: &mut CombatParticipant,
    matchup: Matchup,
    damage: f64,
    ledger: &mut Ledger,
    balance: &BalanceConfig,
) -> i64 {
    let adjusted = damage * defense_multiplier(receiver, matchup, balance);
    let killed = kill_count(adjusted, receiver.life, receiver.remaining());
    receiver.losses.push(killed);

    if killed == 0 {
        return 0;
    }

    let bandwidth = killed * receiver.bandwidth;
    let losing = ledger.side_mut(receiver.side);
    losing.units_lost += killed;
    losing.bandwidth_lost += bandwidth;
    if receiver.category.produces_yield() {
        losing.yield_lost += bandwidth;
    }

    let winning = ledger.side_mut(receiver.side.opponent());
    winning.units_killed += killed;
    winning.bandwidth_killed += bandwidth;

    trace!(
        "{} {:?} lost {} of {} to {:?} (damage {:.2})",
        receiver.name, receiver.side, killed, receiver.amount_before, matchup.attack, adjusted
    );

    killed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Side;
    use crate::category::{Categories, UnitCategory};
    use crate::units::{OwnedUnit, UnitId, UnitRef, UnitSpec};

    fn receiver(life: i64, amount: i64, active: bool, effectors: Categories) -> CombatParticipant {
        let spec = UnitSpec {
            name: "wall".into(),
            category: UnitCategory::Firewall,
            effectors,
            attack: 1,
            life,
            bandwidth: 3,
            memory: 1,
        };
        let mut unit = OwnedUnit::new(UnitId(1), spec, amount);
        unit.active = active;
        CombatParticipant::new(Side::Defender, UnitRef { group: 0, unit: 0 }, &unit, amount, amount)
    }

    fn swarm_on_firewall() -> Matchup {
        Matchup::new(UnitCategory::Swarm, UnitCategory::Firewall)
    }

    #[test]
    fn kill_is_clamped_to_survivors_of_this_resolution() {
        let balance = BalanceConfig::default();
        let mut target = receiver(40, 5, true, Categories::SWARM);
        target.losses.push(3);
        let mut ledger = Ledger::default();

        // 85 adjusted damage against life 40 would kill 2; exactly 2 remain.
        let damage = 85.0 / balance.active_defense;
        let killed = apply(&mut target, swarm_on_firewall(), damage, &mut ledger, &balance);

        assert_eq!(killed, 2);
        assert_eq!(target.remaining(), 0);
        assert_eq!(target.lost(), target.amount_before);

        let again = apply(&mut target, swarm_on_firewall(), 1_000.0, &mut ledger, &balance);
        assert_eq!(again, 0);
        assert_eq!(target.lost(), 5);
    }

    #[test]
    fn multipliers_follow_defense_posture() {
        let balance = BalanceConfig::default();
        let active = receiver(10, 10, true, Categories::SWARM);
        let passive = receiver(10, 10, false, Categories::SWARM);
        let unrelated = receiver(10, 10, true, Categories::DENIAL);

        let m = swarm_on_firewall();
        assert_eq!(defense_multiplier(&active, m, &balance), 0.8);
        assert_eq!(defense_multiplier(&passive, m, &balance), 0.4);
        assert_eq!(defense_multiplier(&unrelated, m, &balance), 0.4);

        let concentrated = Matchup::new(UnitCategory::HunterKiller, UnitCategory::Firewall);
        assert_eq!(defense_multiplier(&passive, concentrated, &balance), 1.0);
    }

    #[test]
    fn ledger_records_both_sides() {
        let balance = BalanceConfig::default();
        let mut target = receiver(10, 10, false, Categories::empty());
        let mut ledger = Ledger::default();

        // 100 * 0.4 = 40 -> 4 killed, 3 bandwidth each
        let killed = apply(&mut target, swarm_on_firewall(), 100.0, &mut ledger, &balance);

        assert_eq!(killed, 4);
        assert_eq!(ledger.defender.units_lost, 4);
        assert_eq!(ledger.defender.bandwidth_lost, 12);
        assert_eq!(ledger.attacker.units_killed, 4);
        assert_eq!(ledger.attacker.bandwidth_killed, 12);
        assert_eq!(ledger.defender.yield_lost, 0);
    }

    #[test]
    fn degenerate_inputs_kill_nothing() {
        assert_eq!(kill_count(100.0, 0, 5), 0);
        assert_eq!(kill_count(-5.0, 10, 5), 0);
        assert_eq!(kill_count(f64::NAN, 10, 5), 0);
        assert_eq!(kill_count(9.99, 10, 5), 0);
    }
}
