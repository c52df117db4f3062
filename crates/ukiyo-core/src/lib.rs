//! # Ukiyo Core
//!
//! The upstream request gateway: everything between a route handler wanting
//! upstream data and the wire.
//!
//! - **`cache`** - seeded-key LRU response cache with per-request policy
//! - **`gateway`** - dispatch state machine and rotating credential pool
//! - **`rewrite`** - CDN hostname -> proxy prefix rewriting
//! - **`fanout`** - fail-fast concurrent join for composite views
//!
//! A typical embedding constructs one [`CacheLayer`] and one credential pool
//! at startup, hands both to a [`Dispatcher`], and builds composite pages by
//! running several dispatcher calls under a [`FanOut`] scope.

pub mod cache;
pub mod fanout;
pub mod gateway;
pub mod rewrite;

pub use cache::{CacheKey, CacheLayer, CachePolicy, CachedItem, KeySeed, LruCache};
pub use fanout::FanOut;
pub use gateway::{CredentialPool, Dispatcher, Payload, RequestOptions, RotatingPool};
pub use rewrite::ContentRewriter;
