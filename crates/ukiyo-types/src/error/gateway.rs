//! Gateway call errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by a single gateway dispatch or a composite fan-out.
///
/// Every call into the gateway yields either a complete result or exactly one
/// of these; there is no partial-data path.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum GatewayError {
    /// Every pool credential is timed out. The pool has been reset to its
    /// initial good state as a side effect, so a later attempt may succeed.
    #[error(
        "All {pool_size} pool credential(s) are timed out; \
         the pool was reset and a subsequent attempt may succeed. \
         Consider configuring additional session credentials."
    )]
    CredentialsExhausted {
        /// Number of credentials managed by the pool
        pool_size: usize,
    },

    /// POST was attempted without an authenticated session credential
    #[error("An authenticated session credential is required for POST requests")]
    MissingCredential,

    /// Connection or timeout failure before an HTTP status was obtained.
    /// Never attributed to credential health.
    #[error("Transport failure for {url}: {message}")]
    Transport {
        /// Request URL that failed
        url: String,
        /// Description of the transport failure
        message: String,
    },

    /// Upstream answered with a non-2xx status code
    #[error("Upstream returned HTTP status {status}")]
    UpstreamStatus {
        /// The HTTP status code received
        status: u16,
    },

    /// The caller's cancellation signal fired. Takes priority over a
    /// status error when both apply.
    #[error("Request cancelled")]
    Cancelled,

    /// Response body did not parse as JSON
    #[error("Response contained invalid JSON: {message}")]
    InvalidJson {
        /// Parser diagnostic
        message: String,
    },

    /// Upstream envelope carried `error: true`
    #[error("Upstream API signalled an error: {message}")]
    UpstreamApi {
        /// Message field from the upstream envelope
        message: String,
    },

    /// Upstream envelope had no `body` field
    #[error("Upstream response is missing the body field")]
    MissingBodyField,
}

impl GatewayError {
    /// Whether this error originated from the caller's cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether the failure happened before any HTTP status was obtained.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
