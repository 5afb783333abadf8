//! Error types for the runtime.

use formica_core::error::CoreError;
use formica_core::types::{AgentId, FoodId};
use thiserror::Error;

/// Failures detected while building a simulation.
///
/// Every variant is raised before the first tick; the tick loop itself has
/// no error surface.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("invalid role table: {0}")]
    Role(#[from] CoreError),

    #[error("failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Failures reported back to brain code. Never fatal to the simulation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainError {
    #[error("{agent} is not touching {food}")]
    NotTouchingFood { agent: AgentId, food: FoodId },
}

/// Result type for configuration and construction.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for brain-facing actions.
pub type DomainResult<T> = Result<T, DomainError>;
