//! Builds both windows of a battle from loaded account state.

use chrono::{DateTime, Utc};

use super::participant::{CombatParticipant, ParticipantArena, ParticipantId};
use super::tally::Ledger;
use super::window::{BattleWindow, Matchup};
use crate::account::{AccountState, Side};
use crate::action::PreparedEngagement;
use crate::config::BalanceConfig;
use crate::units::UnitRef;

/// Every participant and both windows of one resolution.
#[derive(Clone, Debug)]
pub struct Battle {
    pub arena: ParticipantArena,
    pub attacker_window: BattleWindow,
    pub defender_window: BattleWindow,
    pub ledger: Ledger,
}

impl Battle {
    /// Binds the committed attacker units and the defender's standing
    /// inventory into one arena and pairs them into frames.
    ///
    /// Attacker units deal and receive with the committed amount. Every
    /// non-expired defender stack receives; only active, powered stacks with
    /// attack deal, using their full amount.
    pub fn assemble(
        prepared: &PreparedEngagement,
        attacker: &AccountState,
        defender: &AccountState,
        now: DateTime<Utc>,
    ) -> Self {
        let mut arena = ParticipantArena::new();

        for committed in &prepared.committed {
            if let Some(unit) = attacker.unit(committed.at) {
                arena.push(CombatParticipant::new(
                    Side::Attacker,
                    committed.at,
                    unit,
                    committed.amount,
                    committed.amount,
                ));
            }
        }

        for (group_index, group) in defender.groups.iter().enumerate() {
            for (unit_index, unit) in group.units.iter().enumerate() {
                if unit.amount <= 0 || unit.is_expired(now) {
                    continue;
                }
                let deals = unit.active && unit.spec.attack > 0 && group.is_powered();
                let committed = if deals { unit.amount } else { 0 };
                arena.push(CombatParticipant::new(
                    Side::Defender,
                    UnitRef {
                        group: group_index,
                        unit: unit_index,
                    },
                    unit,
                    committed,
                    unit.amount,
                ));
            }
        }

        let attacker_window = pair(&arena, Side::Attacker);
        let defender_window = pair(&arena, Side::Defender);

        Self {
            arena,
            attacker_window,
            defender_window,
            ledger: Ledger::default(),
        }
    }

    /// Renders the attacker's window, then the defender's.
    ///
    /// Defender dealers strike back with whatever survived the first window.
    pub fn fight(&mut self, balance: &BalanceConfig) -> &Ledger {
        self.attacker_window
            .render(&mut self.arena, &mut self.ledger, balance);
        self.defender_window
            .render(&mut self.arena, &mut self.ledger, balance);
        &self.ledger
    }

    pub fn participants(&self, side: Side) -> impl Iterator<Item = &CombatParticipant> {
        self.arena.side(side).map(|(_, participant)| participant)
    }

    /// Units of `side` still standing after the fight.
    pub fn survivors(&self, side: Side) -> i64 {
        self.participants(side)
            .map(CombatParticipant::remaining)
            .sum()
    }
}

/// Pairs `home` dealers against opposing receivers.
fn pair(arena: &ParticipantArena, home: Side) -> BattleWindow {
    let mut window = BattleWindow::new(home);

    let dealers: Vec<ParticipantId> = arena
        .side(home)
        .filter(|(_, p)| p.committed > 0 && p.attack > 0)
        .map(|(id, _)| id)
        .collect();
    let receivers: Vec<ParticipantId> = arena
        .side(home.opponent())
        .filter(|(_, p)| p.amount_before > 0)
        .map(|(id, _)| id)
        .collect();

    for &dealer in &dealers {
        let d = &arena[dealer];
        for target in d.effectors.members() {
            let present = receivers.iter().any(|r| arena[*r].category == target);
            if present {
                window.add_dealer(Matchup::new(d.category, target), dealer);
            }
        }
    }

    for &receiver in &receivers {
        let r = &arena[receiver];
        for &dealer in &dealers {
            let d = &arena[dealer];
            if d.can_target(r) {
                window.add_receiver(Matchup::new(d.category, r.category), receiver);
            }
        }
    }

    window
}
