//! Upstream response envelope.

use serde::{Deserialize, Serialize};

/// An upstream HTTP response reduced to its status code and raw body.
///
/// Immutable once constructed; cached copies are cloned out, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpstreamResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// Whether the status code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as UTF-8 text, with invalid sequences replaced.
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success() {
        assert!(UpstreamResponse::new(200, Vec::new()).is_success());
        assert!(UpstreamResponse::new(204, Vec::new()).is_success());
        assert!(!UpstreamResponse::new(301, Vec::new()).is_success());
        assert!(!UpstreamResponse::new(500, Vec::new()).is_success());
    }
}
