//! Session credential types.

use serde::{Deserialize, Serialize};

/// Health state of a pool credential.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CredentialStatus {
    /// Credential is usable
    Good,
    /// Credential drew a non-2xx response and is backing off
    Unhealthy,
}

/// An opaque upstream session credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    /// The raw session cookie value
    pub value: String,
}

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }
}

/// How the caller wants an outbound request authenticated.
///
/// The hint also scopes cache keys: each variant contributes a distinct
/// identity, so a logged-in caller never reads a response cached for an
/// anonymous one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CredentialHint {
    /// Pull a managed credential from the rotating pool
    #[default]
    Pool,
    /// Use the caller's own session credential
    Session(String),
    /// Synthesize a throwaway random credential, bypassing the pool
    Anonymous,
    /// Send the request without a session cookie at all
    LoggedOut,
}

impl CredentialHint {
    /// Identity string mixed into cache key derivation.
    ///
    /// Caller sessions hash their full credential value; the other variants
    /// each map to one fixed shared scope.
    pub fn cache_identity(&self) -> &str {
        match self {
            Self::Pool => "",
            Self::Session(value) => value,
            Self::Anonymous => "anonymous",
            Self::LoggedOut => "logged-out",
        }
    }

    /// The caller-supplied session value, if this hint carries one.
    pub fn session_value(&self) -> Option<&str> {
        match self {
            Self::Session(value) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_identity_is_distinct_per_scope() {
        let session = CredentialHint::Session("abc123_secret".to_string());
        assert_eq!(session.cache_identity(), "abc123_secret");
        assert_ne!(
            CredentialHint::Anonymous.cache_identity(),
            CredentialHint::LoggedOut.cache_identity()
        );
        assert_eq!(CredentialHint::Pool.cache_identity(), "");
    }

    #[test]
    fn test_session_value() {
        assert_eq!(
            CredentialHint::Session("tok".to_string()).session_value(),
            Some("tok")
        );
        assert_eq!(CredentialHint::Pool.session_value(), None);
    }
}
