//! Errors raised by pure combat resolution.
//!
//! Everything here is detected before a commit is attempted, so callers can
//! report it without any state having changed.

use thiserror::Error;

use crate::account::IdentityId;
use crate::action::ActionKind;
use crate::category::UnitCategory;
use crate::resources::ResourceKind;
use crate::units::UnitId;

/// Rejected request: the caller asked for something the rules forbid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{identity} cannot target itself")]
    SelfTarget { identity: IdentityId },

    #[error("no units were committed")]
    EmptyCommitment,

    #[error("commitment of {amount} for {unit} must be positive")]
    MalformedCommitment { unit: UnitId, amount: i64 },

    #[error("{unit} is not owned by {identity}")]
    UnknownUnit { identity: IdentityId, unit: UnitId },

    #[error("{category} units cannot be used for {action}")]
    CategoryNotAllowed {
        unit: UnitId,
        category: UnitCategory,
        action: ActionKind,
    },

    #[error("{unit} is not running")]
    InactiveUnit { unit: UnitId },

    #[error("{unit} has expired")]
    ExpiredUnit { unit: UnitId },

    #[error("{category} group of {unit} is not powered")]
    Unpowered { unit: UnitId, category: UnitCategory },

    #[error("requested {requested} of {unit} but only {available} are owned")]
    OverCommitted {
        unit: UnitId,
        requested: i64,
        available: i64,
    },

    #[error("engagement needs {required} free memory, {available} available")]
    InsufficientCapacity { required: i64, available: i64 },
}

/// A pool would have ended the transaction negative.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{resource} of {identity} would end at {value}")]
pub struct ResourceExhausted {
    pub identity: IdentityId,
    pub resource: ResourceKind,
    pub value: i64,
}

/// Any failure of the pure resolution pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatRuleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Exhausted(#[from] ResourceExhausted),
}
