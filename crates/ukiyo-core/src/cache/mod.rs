//! Upstream response caching.
//!
//! Three layers, bottom up: a value-generic LRU structure ([`LruCache`]),
//! seeded key derivation ([`CacheKey`]), and the policy engine
//! ([`CacheLayer`]) that decides per request whether the cache may be read
//! or written.

mod key;
mod lru;
mod store;

pub use key::{CacheKey, KeySeed};
pub use lru::LruCache;
pub use store::{CacheLayer, CachePolicy, CachedItem};
