//! Best-effort pre-flight health probe.

use std::time::Duration;

use tracing::{info, warn};

use crate::executor::{ApiOutcome, ApiRequest, HttpMethod, Transport};

use super::ScenarioRunner;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// What the health endpoint reported. No variant fails a scenario.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HealthStatus {
    /// 200.
    Healthy,
    /// 404: the provider does not expose a health endpoint.
    NotExposed,
    /// Any other 4xx.
    ClientError(u16),
    /// Any 5xx.
    ServerError(u16),
    /// A status outside the bands above.
    Unexpected(u16),
    /// No response was received.
    Unreachable(String),
}

impl HealthStatus {
    fn from_outcome(outcome: &ApiOutcome) -> Self {
        match outcome.status {
            0 => Self::Unreachable(
                outcome
                    .error_message()
                    .unwrap_or_else(|| String::from("no response")),
            ),
            200 => Self::Healthy,
            404 => Self::NotExposed,
            code @ 400..=499 => Self::ClientError(code),
            code @ 500.. => Self::ServerError(code),
            code => Self::Unexpected(code),
        }
    }
}

impl<T: Transport> ScenarioRunner<T> {
    /// Probes the configured health path once with a short timeout and logs
    /// the result. Never fails.
    pub async fn probe_health(&self) -> HealthStatus {
        let url = self.config.url_for(&self.config.health_path);
        let request = ApiRequest::new(HttpMethod::Get, url.as_str()).timeout(HEALTH_TIMEOUT);
        let status = HealthStatus::from_outcome(&self.executor.execute_once(&request).await);
        match &status {
            HealthStatus::Healthy => info!(%url, "API is healthy"),
            HealthStatus::NotExposed => {
                info!(%url, "health endpoint not found (acceptable)");
            }
            HealthStatus::ClientError(code) => {
                warn!(%url, code, "health check returned client error");
            }
            HealthStatus::ServerError(code) => {
                warn!(%url, code, "health check returned server error");
            }
            HealthStatus::Unexpected(code) => {
                warn!(%url, code, "health check returned unexpected status");
            }
            HealthStatus::Unreachable(message) => {
                warn!(%url, error = %message, "health check failed");
            }
        }
        status
    }
}
