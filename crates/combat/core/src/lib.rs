//! Deterministic combat rules shared by the runtime and offline tools.
//!
//! `combat-core` owns the pure side of an engagement: category sets,
//! resource pools and unit inventories, request validation, battle
//! aggregation, attrition and outcome scoring. [`resolve::resolve`] ties them
//! together and returns both mutated accounts plus the two [`Event`]s without
//! touching storage; loading, committing and fan-out live in `combat-runtime`.
pub mod account;
pub mod action;
pub mod battle;
pub mod category;
pub mod config;
pub mod error;
pub mod event;
pub mod outcome;
pub mod resolve;
pub mod resources;
pub mod units;

pub use account::{AccountState, ClanId, IdentityId, Side};
pub use action::{ActionKind, CombatRequest, Commitment, CommittedUnit, PreparedEngagement};
pub use battle::{
    Battle, BattleFrame, BattleWindow, CombatParticipant, Ledger, Matchup, ParticipantArena,
    ParticipantId, SideTally,
};
pub use category::{Categories, UnitCategory};
pub use config::BalanceConfig;
pub use error::{CombatRuleError, ResourceExhausted, ValidationError};
pub use event::{BattleResult, Event, Role, Sequence, UnitLoss, WarReference};
pub use outcome::{Award, Outcome, WarStatus};
pub use resolve::{Resolution, resolve};
pub use resources::{ResourceKind, ResourcePools};
pub use units::{OwnedUnit, OwnedUnitGroup, UnitId, UnitRef, UnitSnapshot, UnitSpec};
