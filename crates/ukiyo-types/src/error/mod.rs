//! Typed error definitions for Ukiyo.
//!
//! This module provides a structured error hierarchy with specific error types
//! for different domains. All errors are designed to be:
//!
//! - **Serializable** for API responses via serde
//! - **Displayable** for logging via Display trait
//! - **Matchable** for error handling logic via enum variants
//! - **Composable** via thiserror derive macros

mod config;
mod gateway;

pub use config::ConfigError;
pub use gateway::GatewayError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type that wraps all domain-specific errors.
///
/// Use this when you need a single error type that can represent
/// any Ukiyo error.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "domain", content = "error")]
pub enum UkiyoError {
    /// Wraps a configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Wraps a gateway call error
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

/// Standard Result type using UkiyoError.
pub type Result<T> = std::result::Result<T, UkiyoError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = UkiyoError::Gateway(GatewayError::UpstreamStatus { status: 404 });

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("Gateway"));
        assert!(json.contains("404"));

        let deserialized: UkiyoError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, deserialized);
    }

    #[test]
    fn test_error_display() {
        let err = GatewayError::CredentialsExhausted { pool_size: 3 };

        let msg = format!("{}", err);
        assert!(msg.contains('3'));
        assert!(msg.contains("timed out"));
    }
}
