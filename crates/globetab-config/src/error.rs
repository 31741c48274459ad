//! Configuration error types.

use thiserror::Error;

/// Result type alias for config validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised when a replication config is malformed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("capacity minimum {minimum} exceeds maximum {maximum}")]
    CapacityBounds { minimum: u64, maximum: u64 },

    #[error("target usage must be a fraction in (0, 1], got {0}")]
    UsageOutOfRange(f64),

    #[error("scheduled action {name:?}: minimum {minimum} exceeds maximum {maximum}")]
    ActionBounds {
        name: String,
        minimum: u64,
        maximum: u64,
    },
}
