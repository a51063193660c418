//! Unified error types surfaced by the combat service.
//!
//! Wraps rule violations, store failures and task coordination so callers can
//! decide whether an attempt is worth retrying with fresh state.
use combat_core::{CombatRuleError, IdentityId, Resolution, ResourceExhausted, ValidationError};
use thiserror::Error;

pub use crate::counter::CounterError;
pub use crate::dispatch::DispatchError;
pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, CombatError>;

#[derive(Debug, Error)]
pub enum CombatError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    ResourceExhausted(#[from] ResourceExhausted),

    #[error("{0} not found")]
    NotFound(IdentityId),

    #[error("store temporarily unavailable: {0}")]
    Transient(String),

    /// Another writer committed one of the accounts first; reload and retry.
    #[error("commit lost to a concurrent writer: {0}")]
    Contention(String),

    #[error("repository failure")]
    Repository(#[source] RepositoryError),

    #[error(transparent)]
    Counter(#[from] CounterError),

    /// Both accounts were committed, but the events were never sequenced or
    /// persisted. Replaying the request would apply it twice; finish it with
    /// [`crate::CombatService::dispatch_resolution`] instead.
    #[error("resolution committed but not dispatched")]
    Undispatched {
        resolution: Box<Resolution>,
        #[source]
        source: DispatchError,
    },

    #[error("background task join failed")]
    Join(#[source] tokio::task::JoinError),

    #[error("combat service requires {0} to be configured before building")]
    MissingComponent(&'static str),
}

impl From<RepositoryError> for CombatError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound(identity) => Self::NotFound(identity),
            RepositoryError::Transient(reason) => Self::Transient(reason),
            RepositoryError::Aborted(reason) => Self::Contention(reason),
            other => Self::Repository(other),
        }
    }
}

impl From<CombatRuleError> for CombatError {
    fn from(error: CombatRuleError) -> Self {
        match error {
            CombatRuleError::Validation(e) => Self::Validation(e),
            CombatRuleError::Exhausted(e) => Self::ResourceExhausted(e),
        }
    }
}

/// How a caller should treat an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Retry with freshly loaded state.
    Recoverable,
    /// The request itself is wrong; do not retry unchanged.
    Validation,
    /// Unexpected failure inside the service or its stores.
    Internal,
    /// The service is misconfigured.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }
}

impl CombatError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Contention(_) | Self::Transient(_) => ErrorSeverity::Recoverable,
            Self::Validation(_) | Self::ResourceExhausted(_) | Self::NotFound(_) => {
                ErrorSeverity::Validation
            }
            Self::Repository(_)
            | Self::Counter(_)
            | Self::Undispatched { .. }
            | Self::Join(_) => ErrorSeverity::Internal,
            Self::MissingComponent(_) => ErrorSeverity::Fatal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.severity() == ErrorSeverity::Recoverable
    }

    /// Whether the account changes were committed despite the error.
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Undispatched { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aborted_commit_is_retryable_contention() {
        let error = CombatError::from(RepositoryError::Aborted("stale".into()));
        assert!(matches!(error, CombatError::Contention(_)));
        assert!(error.is_retryable());
    }

    #[test]
    fn validation_is_not_retryable() {
        let error = CombatError::from(CombatRuleError::Validation(
            ValidationError::EmptyCommitment,
        ));
        assert_eq!(error.severity(), ErrorSeverity::Validation);
        assert!(!error.is_retryable());
        assert_eq!(
            CombatError::MissingComponent("accounts").severity().as_str(),
            "fatal"
        );
    }
}
