//! Domain models for the Ukiyo gateway.

mod config;
mod credential;
mod response;

pub use config::{
    default_excluded_paths, CacheConfig, GatewayConfig, PoolConfig, RequestConfig, RewriteConfig,
    SelectionStrategy,
};
pub use credential::{Credential, CredentialHint, CredentialStatus};
pub use response::UpstreamResponse;
