//! Configuration-related errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while constructing gateway components from
/// configuration. These are fatal at startup and not retryable.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum ConfigError {
    /// Cache capacity must be a positive integer
    #[error("Invalid cache capacity: {value} (must be positive)")]
    InvalidCacheCapacity {
        /// The rejected capacity value
        value: usize,
    },

    /// A config field failed validation
    #[error("Config validation error for {field}: {message}")]
    ValidationError {
        /// Name of the field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },
}
