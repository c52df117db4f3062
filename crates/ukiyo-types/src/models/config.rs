//! Gateway configuration models.
//!
//! Loading these from a file or the environment is the embedding
//! application's concern; this crate only defines the shapes, defaults and
//! validation rules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use validator::Validate;

/// Upstream response cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct CacheConfig {
    /// Enable the upstream response cache
    pub enabled: bool,
    /// Maximum number of cached responses
    #[validate(range(min = 1))]
    pub capacity: usize,
    /// Entry lifetime in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    /// Path prefixes never cached, regardless of headers
    #[serde(default = "default_excluded_paths")]
    pub excluded_paths: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 512,
            ttl_secs: default_cache_ttl(),
            excluded_paths: default_excluded_paths(),
        }
    }
}

impl CacheConfig {
    /// Entry lifetime as a [`Duration`].
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

pub const fn default_cache_ttl() -> u64 {
    300
}

/// Endpoints whose responses rotate on every call; caching them only
/// serves stale discovery feeds.
pub fn default_excluded_paths() -> Vec<String> {
    [
        "/ajax/discovery/artworks",
        "/ajax/discovery/novels",
        "/ajax/discovery/users",
        "/ajax/illust/new",
    ]
    .map(String::from)
    .to_vec()
}

/// Credential selection strategy for the rotating pool.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionStrategy {
    /// Cycle through healthy credentials in order
    #[default]
    RoundRobin,
    /// Pick a healthy credential at random
    Random,
    /// Pick the healthy credential that was used longest ago
    LeastRecentlyUsed,
}

/// Rotating credential pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct PoolConfig {
    /// Session credential values available for rotation
    pub credentials: Vec<String>,
    /// How the next healthy credential is chosen
    #[serde(default)]
    pub strategy: SelectionStrategy,
    /// Lockout applied on the first consecutive failure, in seconds
    #[serde(default = "default_base_timeout")]
    #[validate(range(min = 1))]
    pub base_timeout_secs: u64,
    /// Upper bound for the exponential backoff, in seconds
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            credentials: Vec::new(),
            strategy: SelectionStrategy::default(),
            base_timeout_secs: default_base_timeout(),
            max_backoff_secs: default_max_backoff(),
        }
    }
}

impl PoolConfig {
    /// Base lockout as a [`Duration`].
    pub const fn base_timeout(&self) -> Duration {
        Duration::from_secs(self.base_timeout_secs)
    }

    /// Backoff ceiling as a [`Duration`].
    pub const fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }
}

pub const fn default_base_timeout() -> u64 {
    60
}

pub const fn default_max_backoff() -> u64 {
    3600
}

/// Content URL rewriting configuration.
///
/// Maps upstream CDN hostnames to the operator's default proxy prefixes.
/// Callers may override individual entries through their session context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct RewriteConfig {
    /// Upstream CDN hostname -> default proxy prefix
    pub proxies: HashMap<String, String>,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        let mut proxies = HashMap::new();
        proxies.insert("i.pximg.net".to_string(), "/proxy/i.pximg.net".to_string());
        proxies.insert("s.pximg.net".to_string(), "/proxy/s.pximg.net".to_string());
        Self { proxies }
    }
}

/// Outbound request shaping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct RequestConfig {
    /// Accept-Language value forwarded to the upstream
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
    /// User-Agent values, one picked at random per request
    #[serde(default = "default_user_agents")]
    #[validate(length(min = 1))]
    pub user_agents: Vec<String>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            accept_language: default_accept_language(),
            user_agents: default_user_agents(),
        }
    }
}

pub fn default_accept_language() -> String {
    "en".to_string()
}

pub fn default_user_agents() -> Vec<String> {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0"
            .to_string(),
        "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0".to_string(),
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:128.0) Gecko/20100101 Firefox/128.0"
            .to_string(),
    ]
}

/// Full gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct GatewayConfig {
    /// Response cache parameters
    #[serde(default)]
    #[validate(nested)]
    pub cache: CacheConfig,
    /// Credential pool parameters
    #[serde(default)]
    #[validate(nested)]
    pub pool: PoolConfig,
    /// CDN rewrite parameters
    #[serde(default)]
    #[validate(nested)]
    pub rewrite: RewriteConfig,
    /// Outbound request parameters
    #[serde(default)]
    #[validate(nested)]
    pub request: RequestConfig,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        GatewayConfig::default().validate().unwrap();
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = CacheConfig { capacity: 0, ..CacheConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_strategy_round_trips() {
        let json = serde_json::to_string(&SelectionStrategy::LeastRecentlyUsed).unwrap();
        assert_eq!(json, "\"least-recently-used\"");
        let parsed: SelectionStrategy = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, SelectionStrategy::LeastRecentlyUsed);
    }
}
