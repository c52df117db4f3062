//! # Ukiyo Types
//!
//! Core types, models, and error definitions for the Ukiyo gateway.
//!
//! This crate provides the foundational type system for the Ukiyo ecosystem:
//!
//! - **`error`** - Typed error hierarchy for configuration and gateway calls
//! - **`models`** - Domain models (configuration, credentials, response envelopes)
//!
//! ## Architecture Role
//!
//! `ukiyo-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!     ukiyo-types (this crate)
//!           │
//!           ▼
//!      ukiyo-core
//!           │
//!           ▼
//!    route/view layers (external)
//! ```
//!
//! All types are designed to be:
//! - **Serializable** via serde for API/IPC
//! - **Clone** for cheap sharing across async boundaries
//! - **PartialEq** for testing and comparison

pub mod error;
pub mod models;

// Re-export error types for convenience
pub use error::{ConfigError, GatewayError, Result, UkiyoError};

// Re-export core model types
pub use models::{
    CacheConfig, Credential, CredentialHint, CredentialStatus, GatewayConfig, PoolConfig,
    RequestConfig, RewriteConfig, SelectionStrategy, UpstreamResponse,
};
