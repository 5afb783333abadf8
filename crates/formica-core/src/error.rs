//! Error types for the core crate.

use thiserror::Error;

/// Errors raised while defining roles and other static tables.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("role '{role}' is unbalanced: adjustments sum to {sum}, expected 0")]
    UnbalancedRole { role: String, sum: i32 },

    #[error("role name must not be empty")]
    EmptyRoleName,

    #[error("role '{0}' is already defined")]
    DuplicateRole(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
