//! Battle-scoped wrappers around owned units.

use std::ops::{Index, IndexMut};

use crate::account::Side;
use crate::category::{Categories, UnitCategory};
use crate::units::{OwnedUnit, UnitId, UnitRef};

/// Index of a participant inside a [`ParticipantArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(pub usize);

/// One unit stack bound into a single resolution.
///
/// The same participant deals damage in its own side's window and receives
/// damage in the opposing window.
#[derive(Clone, Debug, PartialEq)]
pub struct CombatParticipant {
    pub side: Side,
    pub unit: UnitId,
    pub at: UnitRef,
    pub name: String,
    pub category: UnitCategory,
    pub effectors: Categories,
    pub attack: i64,
    pub life: i64,
    pub bandwidth: i64,
    /// Amount dealing damage.
    pub committed: i64,
    /// Amount exposed to damage when the resolution started.
    pub amount_before: i64,
    /// Kills recorded against this participant, one entry per frame hit.
    pub losses: Vec<i64>,
    /// 1 / number of categories this unit can affect.
    pub efficiency: f64,
    pub active: bool,
}

impl CombatParticipant {
    pub fn new(side: Side, at: UnitRef, unit: &OwnedUnit, committed: i64, exposed: i64) -> Self {
        let targets = unit.spec.effectors.count();
        let efficiency = if targets == 0 {
            0.0
        } else {
            1.0 / targets as f64
        };

        Self {
            side,
            unit: unit.id,
            at,
            name: unit.spec.name.clone(),
            category: unit.spec.category,
            effectors: unit.spec.effectors,
            attack: unit.spec.attack,
            life: unit.spec.life,
            bandwidth: unit.spec.bandwidth,
            committed,
            amount_before: exposed,
            losses: Vec::new(),
            efficiency,
            active: unit.active,
        }
    }

    pub fn lost(&self) -> i64 {
        self.losses.iter().sum()
    }

    /// Units still standing in this resolution.
    pub fn remaining(&self) -> i64 {
        (self.amount_before - self.lost()).max(0)
    }

    /// Damage this participant deals into one frame.
    ///
    /// Dealers that lost units earlier in the resolution strike with survivors only.
    pub fn contribution(&self) -> f64 {
        let striking = self.committed.min(self.remaining());
        striking as f64 * self.attack as f64 * self.efficiency
    }

    /// Active units defend against categories they can themselves affect.
    pub fn defends_against(&self, attack: UnitCategory) -> bool {
        self.active && self.effectors.has(attack)
    }

    pub fn is_owned_by(&self, side: Side) -> bool {
        self.side == side
    }

    pub fn can_target(&self, receiver: &CombatParticipant) -> bool {
        self.effectors.intersects(receiver.category.as_set())
    }
}

/// Owns every participant of one resolution; frames refer to them by index.
#[derive(Clone, Debug, Default)]
pub struct ParticipantArena {
    participants: Vec<CombatParticipant>,
}

impl ParticipantArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, participant: CombatParticipant) -> ParticipantId {
        self.participants.push(participant);
        ParticipantId(self.participants.len() - 1)
    }

    pub fn get(&self, id: ParticipantId) -> Option<&CombatParticipant> {
        self.participants.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParticipantId, &CombatParticipant)> {
        self.participants
            .iter()
            .enumerate()
            .map(|(index, participant)| (ParticipantId(index), participant))
    }

    pub fn side(&self, side: Side) -> impl Iterator<Item = (ParticipantId, &CombatParticipant)> {
        self.iter()
            .filter(move |(_, participant)| participant.is_owned_by(side))
    }
}

impl Index<ParticipantId> for ParticipantArena {
    type Output = CombatParticipant;

    fn index(&self, id: ParticipantId) -> &Self::Output {
        &self.participants[id.0]
    }
}

impl IndexMut<ParticipantId> for ParticipantArena {
    fn index_mut(&mut self, id: ParticipantId) -> &mut Self::Output {
        &mut self.participants[id.0]
    }
}
