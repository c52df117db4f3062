//! Outbound request dispatch.
//!
//! [`Dispatcher`] runs the per-request state machine (credential, cache
//! policy, execution, health feedback); [`CredentialPool`] is the capability
//! it consumes for credential rotation, with [`RotatingPool`] as the
//! production implementation.

mod dispatcher;
mod pool;

pub use dispatcher::{Dispatcher, Payload, RequestOptions};
pub use pool::{CredentialPool, RotatingPool};
