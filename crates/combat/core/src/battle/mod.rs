//! Battle aggregation.
//!
//! A resolution binds every involved unit stack into a [`ParticipantArena`].
//! Each side gets a [`BattleWindow`] whose frames, keyed by [`Matchup`], hold
//! arena indices of the dealers and receivers paired for that category pair.
//! Rendering a window splits each frame's damage over its receivers and
//! converts it to kills via [`attrition`], rolling the totals into a [`Ledger`].

pub mod attrition;
pub mod pairing;
pub mod participant;
pub mod tally;
pub mod window;

pub use pairing::Battle;
pub use participant::{CombatParticipant, ParticipantArena, ParticipantId};
pub use tally::{Ledger, SideTally};
pub use window::{BattleFrame, BattleWindow, Matchup};
