use serde::{Deserialize, Serialize};

use crate::account::Side;

/// Aggregate losses and kills of one side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideTally {
    pub bandwidth_lost: i64,
    pub bandwidth_killed: i64,
    pub units_lost: i64,
    pub units_killed: i64,
    pub yield_lost: i64,
}

/// Both sides' tallies for one resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    pub attacker: SideTally,
    pub defender: SideTally,
}

impl Ledger {
    pub fn side(&self, side: Side) -> &SideTally {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut SideTally {
        match side {
            Side::Attacker => &mut self.attacker,
            Side::Defender => &mut self.defender,
        }
    }
}
