//! Request execution with bounded retry for known transient failures.
//!
//! The executor never fails: every exchange, including network errors,
//! becomes an [`ApiOutcome`] so a single bad request cannot abort a bulk run.
//! Retries are limited to three signatures: timeouts, connection failures,
//! and the provisioning backend's "another update in progress" conflict.

mod transport;

use std::time::Duration;

use serde_json::Value;
use tokio::time::sleep;
use tracing::{info, warn};

pub use transport::{
    ApiRequest, HttpMethod, RawResponse, ReqwestTransport, Transport, TransportError,
    TransportFuture,
};

/// Body fragment the provisioning backend returns with a 400 while another
/// stack update holds the lock.
pub const CONFLICT_SIGNATURE: &str = "Another update is currently in progress";

const NETWORK_BACKOFF: Duration = Duration::from_secs(30);
const CONFLICT_BACKOFF: Duration = Duration::from_secs(60);
const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Result of one HTTP exchange. A status of `0` marks a network-level
/// failure described by [`ApiOutcome::error`].
#[derive(Clone, Debug, PartialEq)]
pub struct ApiOutcome {
    /// HTTP status, or `0` when no response was received.
    pub status: u16,
    /// Raw response body.
    pub body: String,
    /// Body parsed as JSON, when it parses.
    pub json: Option<Value>,
    /// Network error that prevented a response.
    pub error: Option<TransportError>,
}

impl ApiOutcome {
    /// Builds an outcome from a received response.
    #[must_use]
    pub fn from_response(raw: RawResponse) -> Self {
        let json = if raw.body.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&raw.body).ok()
        };
        Self {
            status: raw.status,
            body: raw.body,
            json,
            error: None,
        }
    }

    /// Builds a status-0 outcome for a network failure.
    #[must_use]
    pub const fn network_failure(error: TransportError) -> Self {
        Self {
            status: 0,
            body: String::new(),
            json: None,
            error: Some(error),
        }
    }

    /// Human-readable error message for network failures.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Whether this is the retryable provisioning conflict.
    #[must_use]
    pub fn is_transient_conflict(&self) -> bool {
        self.status == 400 && self.body.contains(CONFLICT_SIGNATURE)
    }
}

/// How many attempts to make and how long to wait between them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first; values below one act as one.
    pub max_attempts: u32,
    /// Wait after a timeout or connection failure.
    pub network_backoff: Duration,
    /// Wait after the provisioning conflict signature.
    pub conflict_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            network_backoff: NETWORK_BACKOFF,
            conflict_backoff: CONFLICT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    #[must_use]
    pub const fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            network_backoff: NETWORK_BACKOFF,
            conflict_backoff: CONFLICT_BACKOFF,
        }
    }

    /// Overrides the attempt budget.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Overrides both backoff delays.
    ///
    /// This is primarily used by tests to keep retry scenarios fast.
    #[must_use]
    pub const fn with_backoff(mut self, network: Duration, conflict: Duration) -> Self {
        self.network_backoff = network;
        self.conflict_backoff = conflict;
        self
    }
}

/// Sends requests through a [`Transport`] and applies the [`RetryPolicy`].
#[derive(Clone, Debug)]
pub struct RequestExecutor<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: Transport> RequestExecutor<T> {
    /// Creates an executor.
    #[must_use]
    pub const fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Returns the active retry policy.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Executes `request` with the configured policy.
    pub async fn execute(&self, request: &ApiRequest) -> ApiOutcome {
        self.execute_with(request, &self.policy).await
    }

    /// Executes `request` once, ignoring the configured attempt budget.
    pub async fn execute_once(&self, request: &ApiRequest) -> ApiOutcome {
        self.execute_with(request, &RetryPolicy::single_attempt())
            .await
    }

    async fn execute_with(&self, request: &ApiRequest, policy: &RetryPolicy) -> ApiOutcome {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            log_request(request, attempt);
            let (outcome, backoff) = match self.transport.send(request).await {
                Ok(raw) => {
                    let outcome = ApiOutcome::from_response(raw);
                    info!(
                        status = outcome.status,
                        body = %outcome.body,
                        "{} {} responded",
                        request.method,
                        request.url
                    );
                    let backoff = outcome
                        .is_transient_conflict()
                        .then_some(policy.conflict_backoff);
                    (outcome, backoff)
                }
                Err(err) => {
                    warn!(error = %err, "{} {} failed", request.method, request.url);
                    let backoff = err.is_retryable().then_some(policy.network_backoff);
                    (ApiOutcome::network_failure(err), backoff)
                }
            };

            match backoff {
                Some(delay) if attempt < max_attempts => {
                    warn!(
                        attempt,
                        max_attempts,
                        delay_secs = delay.as_secs(),
                        "transient failure; retrying after backoff"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Some(_) => {
                    warn!(attempt, "retry budget exhausted");
                    return outcome;
                }
                None => return outcome,
            }
        }
    }
}

fn log_request(request: &ApiRequest, attempt: u32) {
    let headers = request
        .headers
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join(", ");
    let payload = request
        .payload
        .as_ref()
        .and_then(|value| serde_json::to_string_pretty(value).ok())
        .unwrap_or_default();
    info!(
        attempt,
        headers = %headers,
        payload = %payload,
        "sending {} {}",
        request.method,
        request.url
    );
}
