//! Error types raised by repository implementations.

use combat_core::IdentityId;
use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{0} not found")]
    NotFound(IdentityId),

    /// Temporary backend failure; the same call may succeed later.
    #[error("transient store failure: {0}")]
    Transient(String),

    /// A multi-record commit was rejected as a whole.
    #[error("commit aborted: {0}")]
    Aborted(String),

    #[error("repository lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
