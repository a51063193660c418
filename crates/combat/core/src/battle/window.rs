//! Frames and windows of one battle.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::attrition;
use super::participant::{ParticipantArena, ParticipantId};
use super::tally::Ledger;
use crate::account::Side;
use crate::category::UnitCategory;
use crate::config::BalanceConfig;

/// Key of a frame: attacking category against receiving category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Matchup {
    pub attack: UnitCategory,
    pub target: UnitCategory,
}

impl Matchup {
    pub const fn new(attack: UnitCategory, target: UnitCategory) -> Self {
        Self { attack, target }
    }
}

/// Dealers and receivers of one matchup.
#[derive(Clone, Debug, PartialEq)]
pub struct BattleFrame {
    pub matchup: Matchup,
    dealers: Vec<ParticipantId>,
    receivers: Vec<ParticipantId>,
    rendered: bool,
}

impl BattleFrame {
    fn new(matchup: Matchup) -> Self {
        Self {
            matchup,
            dealers: Vec::new(),
            receivers: Vec::new(),
            rendered: false,
        }
    }

    pub fn dealers(&self) -> &[ParticipantId] {
        &self.dealers
    }

    pub fn receivers(&self) -> &[ParticipantId] {
        &self.receivers
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    /// Total damage the dealers put into this frame.
    pub fn damage(&self, arena: &ParticipantArena) -> f64 {
        self.dealers.iter().map(|id| arena[*id].contribution()).sum()
    }

    /// Splits the frame's damage evenly over its receivers. Renders at most once.
    fn render(&mut self, arena: &mut ParticipantArena, ledger: &mut Ledger, balance: &BalanceConfig) {
        if self.rendered {
            return;
        }
        self.rendered = true;

        let total = self.damage(arena);
        if total <= 0.0 || self.receivers.is_empty() {
            return;
        }
        let per_receiver = total / self.receivers.len() as f64;

        let mut killed = 0;
        for id in &self.receivers {
            killed += attrition::apply(&mut arena[*id], self.matchup, per_receiver, ledger, balance);
        }

        debug!(
            "frame {:?} -> {:?}: {:.2} damage over {} receivers, {} killed",
            self.matchup.attack,
            self.matchup.target,
            total,
            self.receivers.len(),
            killed
        );
    }
}

/// One side's full view of the battle.
#[derive(Clone, Debug, PartialEq)]
pub struct BattleWindow {
    home: Side,
    frames: BTreeMap<Matchup, BattleFrame>,
}

impl BattleWindow {
    pub fn new(home: Side) -> Self {
        Self {
            home,
            frames: BTreeMap::new(),
        }
    }

    pub fn home(&self) -> Side {
        self.home
    }

    /// Adds a dealer to the matchup's frame, creating the frame on first use.
    pub fn add_dealer(&mut self, matchup: Matchup, dealer: ParticipantId) {
        self.frames
            .entry(matchup)
            .or_insert_with(|| BattleFrame::new(matchup))
            .dealers
            .push(dealer);
    }

    /// Adds a receiver to the matchup's frame.
    ///
    /// Returns `false` without changing the frame if the participant is
    /// already receiving in it.
    pub fn add_receiver(&mut self, matchup: Matchup, receiver: ParticipantId) -> bool {
        let frame = self
            .frames
            .entry(matchup)
            .or_insert_with(|| BattleFrame::new(matchup));
        if frame.receivers.contains(&receiver) {
            return false;
        }
        frame.receivers.push(receiver);
        true
    }

    pub fn frame(&self, matchup: Matchup) -> Option<&BattleFrame> {
        self.frames.get(&matchup)
    }

    pub fn frames(&self) -> impl Iterator<Item = &BattleFrame> {
        self.frames.values()
    }

    /// Renders every frame in matchup order.
    pub fn render(&mut self, arena: &mut ParticipantArena, ledger: &mut Ledger, balance: &BalanceConfig) {
        debug!("rendering {:?} window with {} frames", self.home, self.frames.len());
        for frame in self.frames.values_mut() {
            frame.render(arena, ledger, balance);
        }
    }
}
