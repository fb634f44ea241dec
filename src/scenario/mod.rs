//! Scenario execution: build a payload, send it, classify the response, and
//! recover the created identifier.
//!
//! A [`Scenario`] is a declarative description of one API interaction. The
//! [`ScenarioRunner`] executes it with a fresh [`ScenarioContext`] so no
//! state leaks between instances, which lets the bulk orchestrator reuse one
//! runner for every iteration.

pub mod catalog;
mod context;
mod error;
mod health;

use tracing::{info, warn};

use crate::classify::{
    ExpectedStatus, ExtractedIdentifier, IdentifierFormat, Verdict, body_contains,
    classify_status, extract_identifier, strategy_names,
};
use crate::config::HarnessConfig;
use crate::executor::{
    ApiOutcome, ApiRequest, HttpMethod, RequestExecutor, RetryPolicy, ReqwestTransport,
    Transport, TransportError,
};
use crate::payload::{PayloadBuilder, RequestPayload};

pub use context::ScenarioContext;
pub use error::{Diagnostic, ScenarioError};
pub use health::HealthStatus;

const ID_PLACEHOLDER: &str = "{id}";

/// The API call a scenario makes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Operation {
    /// `POST` to the VPC create path.
    CreateVpc,
    /// `DELETE` to the VPC delete path.
    DeleteVpc {
        /// VPC to delete.
        id: String,
    },
    /// `POST` to the subnet create path.
    CreateSubnet,
    /// `DELETE` to the subnet delete path.
    DeleteSubnet {
        /// Subnet to delete.
        id: String,
    },
}

impl Operation {
    /// HTTP verb for this operation.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        match self {
            Self::CreateVpc | Self::CreateSubnet => HttpMethod::Post,
            Self::DeleteVpc { .. } | Self::DeleteSubnet { .. } => HttpMethod::Delete,
        }
    }

    /// Resolves the configured path template for this operation.
    #[must_use]
    pub fn path(&self, config: &HarnessConfig) -> String {
        match self {
            Self::CreateVpc => config.vpc_create_path.clone(),
            Self::CreateSubnet => config.subnet_create_path.clone(),
            Self::DeleteVpc { id } => config.vpc_delete_path.replace(ID_PLACEHOLDER, id),
            Self::DeleteSubnet { id } => config.subnet_delete_path.replace(ID_PLACEHOLDER, id),
        }
    }

    /// Short label used in log lines.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::CreateVpc => "create VPC",
            Self::DeleteVpc { .. } => "delete VPC",
            Self::CreateSubnet => "create subnet",
            Self::DeleteSubnet { .. } => "delete subnet",
        }
    }

    const fn creates(&self) -> bool {
        matches!(self, Self::CreateVpc | Self::CreateSubnet)
    }
}

/// What the scenario expects of the created identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IdentifierExpectation {
    /// Do not look for an identifier.
    Ignore,
    /// Look for one; a missing or malformed identifier is only a warning.
    Recover(Option<IdentifierFormat>),
    /// Fail the scenario unless a well-formed identifier is present.
    Require(Option<IdentifierFormat>),
}

/// Parameters that replace a scenario's field table for one bulk iteration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BulkParameters {
    /// Unique resource name.
    pub resource_name: String,
    /// Unique stack name.
    pub stack_name: String,
    /// CIDR block for this iteration.
    pub primary_value: String,
    /// Parent VPC for subnet iterations.
    pub parent_id: Option<String>,
}

/// Declarative description of one API interaction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Scenario {
    /// Name used in logs and reports.
    pub name: String,
    /// API call to make.
    pub operation: Operation,
    /// `key=value` field table text.
    pub fields: String,
    /// Statuses that count as success.
    pub expected: ExpectedStatus,
    /// Identifier handling after a successful status.
    pub identifier: IdentifierExpectation,
    /// Text the body must contain, if any.
    pub body_contains: Option<String>,
    /// Whether to probe the health endpoint first.
    pub health_probe: bool,
}

impl Scenario {
    /// Creates a scenario expecting `200` or `201` and ignoring identifiers.
    #[must_use]
    pub fn new(name: impl Into<String>, operation: Operation) -> Self {
        Self {
            name: name.into(),
            operation,
            fields: String::new(),
            expected: ExpectedStatus::any_of(&[200, 201]),
            identifier: IdentifierExpectation::Ignore,
            body_contains: None,
            health_probe: false,
        }
    }

    /// Sets the field table text.
    #[must_use]
    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = fields.into();
        self
    }

    /// Replaces the expected status set.
    #[must_use]
    pub fn expect_status(mut self, expected: ExpectedStatus) -> Self {
        self.expected = expected;
        self
    }

    /// Fails unless an identifier, optionally of `format`, is returned.
    #[must_use]
    pub const fn require_identifier(mut self, format: Option<IdentifierFormat>) -> Self {
        self.identifier = IdentifierExpectation::Require(format);
        self
    }

    /// Records an identifier when one is returned.
    #[must_use]
    pub const fn recover_identifier(mut self, format: Option<IdentifierFormat>) -> Self {
        self.identifier = IdentifierExpectation::Recover(format);
        self
    }

    /// Requires `text` in the response body.
    #[must_use]
    pub fn expect_body_containing(mut self, text: impl Into<String>) -> Self {
        self.body_contains = Some(text.into());
        self
    }

    /// Probes the health endpoint before sending.
    #[must_use]
    pub const fn with_health_probe(mut self) -> Self {
        self.health_probe = true;
        self
    }

    /// Field table for this run. Bulk parameters replace the declared table
    /// with the operation's bulk template.
    #[must_use]
    pub fn fields_for(&self, params: Option<&BulkParameters>, config: &HarnessConfig) -> String {
        params
            .and_then(|params| catalog::bulk_fields(&self.operation, params, config))
            .unwrap_or_else(|| self.fields.clone())
    }
}

/// Result of a scenario that passed every step.
#[derive(Clone, Debug, PartialEq)]
pub struct ScenarioReport {
    /// Scenario name.
    pub scenario: String,
    /// Matching status.
    pub status: u16,
    /// Identifier recovered from the body, when one was looked for.
    pub identifier: Option<ExtractedIdentifier>,
    /// Payload that was sent.
    pub payload: RequestPayload,
    /// Final response.
    pub outcome: ApiOutcome,
    /// Effective region for this instance.
    pub region: Option<String>,
}

impl ScenarioReport {
    /// Recovered identifier value, if any.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_ref().and_then(ExtractedIdentifier::found)
    }
}

/// Runs scenarios against the configured API.
#[derive(Clone, Debug)]
pub struct ScenarioRunner<T> {
    executor: RequestExecutor<T>,
    config: HarnessConfig,
}

impl ScenarioRunner<ReqwestTransport> {
    /// Builds a runner backed by `reqwest` using the configured timeouts and
    /// attempt budget.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the HTTP client cannot be built.
    pub fn from_config(config: HarnessConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(config.connect_timeout(), config.read_timeout())?;
        let policy = RetryPolicy::default().with_max_attempts(config.max_attempts);
        Ok(Self::new(RequestExecutor::new(transport, policy), config))
    }
}

impl<T: Transport> ScenarioRunner<T> {
    /// Creates a runner.
    #[must_use]
    pub const fn new(executor: RequestExecutor<T>, config: HarnessConfig) -> Self {
        Self { executor, config }
    }

    /// Resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Runs `scenario`, stopping at the first failed step.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] describing the failed step together with
    /// the request and response that produced it.
    pub async fn run(
        &self,
        scenario: &Scenario,
        params: Option<&BulkParameters>,
    ) -> Result<ScenarioReport, ScenarioError> {
        let mut context =
            ScenarioContext::new(self.config.cloud_account_id, &self.config.cloud_region);
        info!(scenario = %scenario.name, "starting scenario");

        if scenario.health_probe {
            self.probe_health().await;
        }

        let fields = scenario.fields_for(params, &self.config);
        let payload = PayloadBuilder::build_from_text(&fields, &mut context.prior).map_err(
            |cause| ScenarioError::Payload {
                scenario: scenario.name.clone(),
                cause,
            },
        )?;
        context.payload = Some(payload.clone());

        let request = ApiRequest::new(
            scenario.operation.method(),
            self.config.url_for(&scenario.operation.path(&self.config)),
        )
        .headers(self.config.default_headers())
        .payload(payload.to_value());
        let outcome = self.executor.execute(&request).await;
        context.outcome = Some(outcome.clone());

        let status = match classify_status(&outcome, &scenario.expected) {
            Verdict::Pass { status } => status,
            Verdict::Fail(failure) => {
                warn!(scenario = %scenario.name, kind = %failure.kind, "{}", failure.message);
                return Err(ScenarioError::Status {
                    scenario: scenario.name.clone(),
                    failure,
                    diagnostic: diagnostic(&request, &outcome, None),
                });
            }
        };

        let identifier = self.identifier_step(scenario, &request, &outcome)?;
        context.identifier = identifier
            .as_ref()
            .and_then(ExtractedIdentifier::found)
            .map(str::to_owned);

        if let Some(expected) = &scenario.body_contains {
            if !body_contains(&outcome, expected) {
                return Err(ScenarioError::BodyMismatch {
                    scenario: scenario.name.clone(),
                    expected: expected.clone(),
                    diagnostic: diagnostic(&request, &outcome, None),
                });
            }
        }

        let region = context.region().map(str::to_owned);
        if let Some(id) = &context.identifier {
            info!(
                scenario = %scenario.name,
                status,
                id = %id,
                "{} succeeded",
                scenario.operation.label()
            );
            if scenario.operation.creates() {
                let name = payload
                    .get_str("name")
                    .or_else(|| payload.tag("Name"))
                    .unwrap_or_default();
                info!(
                    "CLEANUP_REQUIRED|ID={id}|REGION={}|NAME={name}",
                    region.as_deref().unwrap_or_default()
                );
            }
        } else {
            info!(
                scenario = %scenario.name,
                status,
                "{} succeeded",
                scenario.operation.label()
            );
        }

        Ok(ScenarioReport {
            scenario: scenario.name.clone(),
            status,
            identifier,
            payload,
            outcome,
            region,
        })
    }

    fn identifier_step(
        &self,
        scenario: &Scenario,
        request: &ApiRequest,
        outcome: &ApiOutcome,
    ) -> Result<Option<ExtractedIdentifier>, ScenarioError> {
        let (format, required) = match scenario.identifier {
            IdentifierExpectation::Ignore => return Ok(None),
            IdentifierExpectation::Recover(format) => (format, false),
            IdentifierExpectation::Require(format) => (format, true),
        };
        let attempted = Some(strategy_names().join(" -> "));

        let extracted = match extract_identifier(outcome) {
            Ok(extracted) => extracted,
            Err(_) if !required => {
                warn!(scenario = %scenario.name, "response is not JSON; no identifier recorded");
                return Ok(Some(ExtractedIdentifier::not_found()));
            }
            Err(_) => {
                return Err(ScenarioError::NonJsonResponse {
                    scenario: scenario.name.clone(),
                    diagnostic: diagnostic(request, outcome, attempted),
                });
            }
        };

        let Some(value) = extracted.found() else {
            if required {
                return Err(ScenarioError::IdentifierNotFound {
                    scenario: scenario.name.clone(),
                    diagnostic: diagnostic(request, outcome, attempted),
                });
            }
            warn!(scenario = %scenario.name, "no identifier found in response");
            return Ok(Some(extracted));
        };

        if let Some(format) = format {
            if !format.matches(value) {
                if required {
                    return Err(ScenarioError::IdentifierMalformed {
                        scenario: scenario.name.clone(),
                        identifier: value.to_owned(),
                        expected: format.to_string(),
                        diagnostic: diagnostic(request, outcome, attempted),
                    });
                }
                warn!(
                    scenario = %scenario.name,
                    id = %value,
                    expected = %format,
                    "identifier does not match the expected format"
                );
            }
        }
        info!(id = %value, source = %extracted.source, "identifier extracted");
        Ok(Some(extracted))
    }
}

fn diagnostic(
    request: &ApiRequest,
    outcome: &ApiOutcome,
    extraction: Option<String>,
) -> Box<Diagnostic> {
    Box::new(Diagnostic {
        method: request.method,
        url: request.url.clone(),
        headers: request.headers.clone(),
        payload: request.payload.clone(),
        outcome: outcome.clone(),
        extraction,
    })
}
