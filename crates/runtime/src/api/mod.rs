//! Types callers of the combat service interact with.

mod errors;

pub use errors::{CombatError, CounterError, DispatchError, ErrorSeverity, RepositoryError, Result};
