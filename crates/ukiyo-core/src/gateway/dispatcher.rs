//! Per-request dispatch state machine.
//!
//! One dispatch runs: acquire credential -> (GET only) consult cache policy
//! -> build request -> execute -> classify. Classification feeds credential
//! health back to the pool and successful GET responses into the cache
//! write leg.

use std::sync::Arc;
use std::time::Instant;

use rand::Rng;
use reqwest::header::{ACCEPT_LANGUAGE, CONTENT_TYPE, COOKIE, USER_AGENT};
use reqwest::Method;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use ukiyo_types::error::GatewayError;
use ukiyo_types::models::{Credential, CredentialHint, CredentialStatus, RequestConfig};
use ukiyo_types::UpstreamResponse;

use crate::cache::CacheLayer;

use super::pool::CredentialPool;

/// Session cookie the upstream authenticates by.
const SESSION_COOKIE: &str = "PHPSESSID";
/// CSRF header attached to every POST.
const CSRF_HEADER: &str = "x-csrf-token";

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Payload shapes supported for POST requests. No other shapes exist.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Raw body with an explicit content type
    Raw { body: String, content_type: String },
    /// Field map encoded as multipart form data
    Multipart(Vec<(String, String)>),
}

/// Consolidated parameters for one dispatch.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Full upstream URL
    pub url: String,
    /// How to authenticate the outbound request
    pub auth: CredentialHint,
    /// Cache-Control value forwarded from the caller, if any
    pub cache_control: Option<String>,
    /// CSRF token for POST requests
    pub csrf: Option<String>,
}

impl RequestOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), ..Self::default() }
    }

    pub fn with_auth(mut self, auth: CredentialHint) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_cache_control(mut self, value: impl Into<String>) -> Self {
        self.cache_control = Some(value.into());
        self
    }

    pub fn with_csrf(mut self, token: impl Into<String>) -> Self {
        self.csrf = Some(token.into());
        self
    }
}

/// Orchestrates outbound upstream calls.
///
/// Holds the shared HTTP client, the cache layer and the credential pool;
/// cheap to share behind an [`Arc`].
pub struct Dispatcher {
    http: reqwest::Client,
    cache: Arc<CacheLayer>,
    pool: Arc<dyn CredentialPool>,
    config: RequestConfig,
}

impl Dispatcher {
    /// Create a dispatcher over a pre-built HTTP client.
    ///
    /// Accepting the client avoids blocking TLS initialization inside an
    /// async runtime.
    pub fn new(
        http: reqwest::Client,
        cache: Arc<CacheLayer>,
        pool: Arc<dyn CredentialPool>,
        config: RequestConfig,
    ) -> Self {
        Self { http, cache, pool, config }
    }

    /// Perform a GET request.
    pub async fn get(
        &self,
        opts: RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<UpstreamResponse, GatewayError> {
        self.dispatch(Method::GET, opts, None, cancel).await
    }

    /// Perform a POST request.
    ///
    /// Requires a non-empty caller session credential; this is a hard
    /// precondition, not attempted otherwise.
    pub async fn post(
        &self,
        opts: RequestOptions,
        payload: Payload,
        cancel: &CancellationToken,
    ) -> Result<UpstreamResponse, GatewayError> {
        if opts.auth.session_value().map_or(true, str::is_empty) {
            return Err(GatewayError::MissingCredential);
        }

        self.dispatch(Method::POST, opts, Some(payload), cancel).await
    }

    /// GET returning the raw body after checking it parses as JSON.
    pub async fn fetch_json(
        &self,
        opts: RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, GatewayError> {
        let response = self.get(opts, cancel).await?;

        serde_json::from_slice::<serde_json::Value>(&response.body)
            .map_err(|e| GatewayError::InvalidJson { message: e.to_string() })?;

        Ok(response.body)
    }

    /// GET unwrapping the upstream `{ error, message, body }` envelope.
    ///
    /// Fails when the response is not JSON, when `error` is true, or when
    /// the `body` field is missing.
    pub async fn fetch_json_body(
        &self,
        opts: RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value, GatewayError> {
        let response = self.get(opts, cancel).await?;

        let value: serde_json::Value = serde_json::from_slice(&response.body)
            .map_err(|e| GatewayError::InvalidJson { message: e.to_string() })?;

        if value.get("error").and_then(serde_json::Value::as_bool).unwrap_or(false) {
            let message = value
                .get("message")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(GatewayError::UpstreamApi { message });
        }

        match value.get("body") {
            Some(body) => Ok(body.clone()),
            None => Err(GatewayError::MissingBodyField),
        }
    }

    async fn dispatch(
        &self,
        method: Method,
        opts: RequestOptions,
        payload: Option<Payload>,
        cancel: &CancellationToken,
    ) -> Result<UpstreamResponse, GatewayError> {
        // AcquireCredential
        let credential = self.resolve_credential(&opts.auth)?;

        // ConsultCachePolicy (GET only)
        let identity = opts.auth.cache_identity();
        if method == Method::GET {
            let policy =
                self.cache.policy_for(&opts.url, identity, opts.cache_control.as_deref());
            if let Some(cached) = policy.cached {
                return Ok(cached);
            }
        }

        // BuildRequest
        let mut request = self
            .http
            .request(method.clone(), &opts.url)
            .header(USER_AGENT, self.random_user_agent())
            .header(ACCEPT_LANGUAGE, &self.config.accept_language);

        if let Some(credential) = &credential {
            request = request.header(COOKIE, format!("{SESSION_COOKIE}={}", credential.value));
        }

        if method == Method::POST {
            request = request.header(CSRF_HEADER, opts.csrf.as_deref().unwrap_or_default());
            match payload {
                Some(Payload::Raw { body, content_type }) => {
                    request = request.header(CONTENT_TYPE, content_type).body(body);
                }
                Some(Payload::Multipart(fields)) => {
                    let mut form = reqwest::multipart::Form::new();
                    for (name, value) in fields {
                        form = form.text(name, value);
                    }
                    request = request.multipart(form);
                }
                None => {}
            }
        }

        // Execute. Transport failures and cancellation propagate here
        // without touching credential health.
        let response = self.execute(request, &method, &opts.url, cancel).await?;

        // Classify
        if response.is_success() {
            if let Some(credential) = &credential {
                self.pool.mark_status(credential, CredentialStatus::Good);
            }

            if method == Method::GET {
                self.cache.store(&opts.url, identity, opts.cache_control.as_deref(), &response);
            }

            return Ok(response);
        }

        if let Some(credential) = &credential {
            self.pool.mark_status(credential, CredentialStatus::Unhealthy);
        }

        // Cancellation takes priority over the status error.
        if cancel.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }

        Err(GatewayError::UpstreamStatus { status: response.status })
    }

    fn resolve_credential(
        &self,
        hint: &CredentialHint,
    ) -> Result<Option<Credential>, GatewayError> {
        match hint {
            CredentialHint::Session(value) => Ok(Some(Credential::new(value.clone()))),
            CredentialHint::Anonymous => Ok(Some(random_credential())),
            CredentialHint::LoggedOut => Ok(None),
            CredentialHint::Pool => match self.pool.acquire() {
                Some(credential) => Ok(Some(credential)),
                None => {
                    // Resetting benefits the next attempt by any caller;
                    // the current attempt still fails.
                    self.pool.reset_all();
                    Err(GatewayError::CredentialsExhausted { pool_size: self.pool.len() })
                }
            },
        }
    }

    /// Run the HTTP exchange under the caller's cancellation scope and emit
    /// the observability record for this real upstream call.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        method: &Method,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<UpstreamResponse, GatewayError> {
        let start = Instant::now();
        let correlation_id = Uuid::new_v4();

        let exchange = async {
            let response = request.send().await.map_err(|e| GatewayError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

            let status = response.status().as_u16();
            let body = response.bytes().await.map_err(|e| GatewayError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

            Ok(UpstreamResponse::new(status, body.to_vec()))
        };

        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(GatewayError::Cancelled),
            result = exchange => result,
        };

        tracing::info!(
            target: "ukiyo::upstream",
            %correlation_id,
            method = %method,
            url,
            status = outcome.as_ref().map(|r| r.status).unwrap_or(0),
            duration_ms = start.elapsed().as_millis() as u64,
            error = ?outcome.as_ref().err(),
            "upstream exchange"
        );

        outcome
    }

    fn random_user_agent(&self) -> &str {
        let agents = &self.config.user_agents;
        if agents.is_empty() {
            return DEFAULT_USER_AGENT;
        }
        &agents[rand::thread_rng().gen_range(0..agents.len())]
    }
}

/// Throwaway anonymous credential: a random 33-character lowercase value,
/// matching the shape the upstream accepts for unauthenticated-but-present
/// identities. Doesn't need to be cryptographically secure.
fn random_credential() -> Credential {
    const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
    const LENGTH: usize = 33;

    let mut rng = rand::thread_rng();
    let value: String = (0..LENGTH)
        .map(|_| LETTERS[rng.gen_range(0..LETTERS.len())] as char)
        .collect();

    Credential::new(value)
}
