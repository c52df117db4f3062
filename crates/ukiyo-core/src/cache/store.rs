//! Cache policy engine and invalidation.

use std::time::{Duration, Instant};

use url::Url;

use ukiyo_types::error::ConfigError;
use ukiyo_types::models::CacheConfig;
use ukiyo_types::UpstreamResponse;

use super::key::{CacheKey, KeySeed};
use super::lru::LruCache;

/// A cached upstream response with its expiry and original URL.
///
/// The URL is kept so prefix invalidation can match entries without knowing
/// their derived keys.
#[derive(Debug, Clone)]
pub struct CachedItem {
    pub response: UpstreamResponse,
    pub expires_at: Instant,
    pub url: String,
}

/// Per-request cache decision. Computed fresh for every request, never
/// persisted.
#[derive(Debug, Clone, Default)]
pub struct CachePolicy {
    /// Whether a fresh response may be written back after the fetch.
    pub store_allowed: bool,
    /// Live cached response, when one may be used.
    pub cached: Option<UpstreamResponse>,
}

impl CachePolicy {
    /// Never read, never write.
    const fn deny() -> Self {
        Self { store_allowed: false, cached: None }
    }
}

/// Policy-aware front of the response cache.
///
/// Owns the LRU structure and the key seed; the dispatcher consults it for
/// the read leg before a GET and hands successful GET responses back to the
/// write leg.
pub struct CacheLayer {
    cache: Option<LruCache<CacheKey, CachedItem>>,
    excluded_paths: Vec<String>,
    ttl: Duration,
    seed: KeySeed,
}

impl CacheLayer {
    /// Build the layer from configuration and the process seed.
    ///
    /// A disabled cache yields a layer that answers "never read, never
    /// write" to every request, so callers need no separate code path.
    pub fn new(config: &CacheConfig, seed: KeySeed) -> Result<Self, ConfigError> {
        let cache = if config.enabled {
            Some(LruCache::new(config.capacity)?)
        } else {
            tracing::info!("response cache disabled, skipping initialization");
            None
        };

        Ok(Self {
            cache,
            excluded_paths: config.excluded_paths.clone(),
            ttl: config.ttl(),
            seed,
        })
    }

    /// Decide the read leg for one request and surface a live entry if
    /// policy allows using it.
    ///
    /// `no-cache` bypasses reads only; the fresh response may still be
    /// stored afterwards. An expired entry is removed here and never
    /// surfaced, so the LRU below stays expiry-agnostic.
    pub fn policy_for(
        &self,
        url: &str,
        credential: &str,
        cache_control: Option<&str>,
    ) -> CachePolicy {
        let Some(cache) = &self.cache else {
            return CachePolicy::deny();
        };
        if self.is_excluded(url) {
            return CachePolicy::deny();
        }

        let directives = cache_control.unwrap_or("").to_ascii_lowercase();
        let store_allowed = !directives.contains("no-store");

        if directives.contains("no-cache") {
            return CachePolicy { store_allowed, cached: None };
        }

        let key = CacheKey::derive(self.seed, url, credential);
        if let Some(item) = cache.get(&key) {
            if Instant::now() < item.expires_at {
                tracing::debug!(%key, url, "cache hit");
                return CachePolicy { store_allowed, cached: Some(item.response) };
            }
            cache.remove(&key);
            tracing::debug!(%key, url, "cache entry expired");
        }

        CachePolicy { store_allowed, cached: None }
    }

    /// Write leg: store a fresh response if policy allows it.
    pub fn store(
        &self,
        url: &str,
        credential: &str,
        cache_control: Option<&str>,
        response: &UpstreamResponse,
    ) {
        let Some(cache) = &self.cache else {
            return;
        };
        if self.is_excluded(url) {
            return;
        }

        let directives = cache_control.unwrap_or("").to_ascii_lowercase();
        if directives.contains("no-store") {
            return;
        }

        let key = CacheKey::derive(self.seed, url, credential);
        cache.add(
            key,
            CachedItem {
                response: response.clone(),
                expires_at: Instant::now() + self.ttl,
                url: url.to_string(),
            },
        );
    }

    /// Remove every live entry whose original URL starts with any of the
    /// given prefixes. Returns the number of removed entries and their URLs.
    ///
    /// A no-op returning zero when caching is disabled or the prefix list is
    /// empty. Safe under concurrent use; each underlying cache operation is
    /// atomic.
    pub fn invalidate_urls(&self, prefixes: &[String]) -> (usize, Vec<String>) {
        let mut invalidated = Vec::new();

        let Some(cache) = &self.cache else {
            tracing::debug!("skipping URL invalidation, cache disabled");
            return (0, invalidated);
        };
        if prefixes.is_empty() {
            tracing::debug!("skipping URL invalidation, no prefixes provided");
            return (0, invalidated);
        }

        // Derived keys cannot be reconstructed from prefixes, so this is a
        // scan over all entries. Acceptable at configured capacities.
        for key in cache.keys() {
            let Some(item) = cache.peek(&key) else {
                continue;
            };
            if !prefixes.iter().any(|p| item.url.starts_with(p.as_str())) {
                continue;
            }

            cache.remove(&key);
            invalidated.push(item.url);
        }

        tracing::debug!(count = invalidated.len(), "invalidated cached URLs by prefix");
        (invalidated.len(), invalidated)
    }

    /// Current number of cached entries. Zero when disabled.
    pub fn len(&self) -> usize {
        self.cache.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_excluded(&self, raw_url: &str) -> bool {
        // An unparseable URL is treated as excluded rather than cached
        // under a garbage key.
        let Ok(parsed) = Url::parse(raw_url) else {
            return true;
        };

        let path = parsed.path();
        self.excluded_paths.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }
}
