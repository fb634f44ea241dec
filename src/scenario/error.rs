//! Scenario failures and the diagnostic context attached to them.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::classify::{FailureKind, StatusFailure};
use crate::executor::{ApiOutcome, HttpMethod};
use crate::payload::PayloadError;

/// Everything needed to diagnose a failed step without re-running it.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    /// HTTP verb sent.
    pub method: HttpMethod,
    /// URL called.
    pub url: String,
    /// Headers sent.
    pub headers: Vec<(String, String)>,
    /// Payload sent.
    pub payload: Option<Value>,
    /// Final outcome after retries.
    pub outcome: ApiOutcome,
    /// Identifier strategies attempted, when extraction ran.
    pub extraction: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  request: {} {}", self.method, self.url)?;
        for (name, value) in &self.headers {
            writeln!(f, "  header: {name}: {value}")?;
        }
        if let Some(payload) = &self.payload {
            writeln!(f, "  payload: {payload}")?;
        }
        if let Some(extraction) = &self.extraction {
            writeln!(f, "  extraction attempted: {extraction}")?;
        }
        if let Some(error) = &self.outcome.error {
            writeln!(f, "  error: {error}")?;
        }
        writeln!(f, "  status: {}", self.outcome.status)?;
        write!(f, "  body: {}", self.outcome.body)
    }
}

/// Errors raised by a scenario instance. Each step stops the instance at the
/// first failure; other instances are unaffected.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The field table could not be turned into a payload.
    #[error("scenario '{scenario}': {cause}")]
    Payload {
        /// Scenario name.
        scenario: String,
        /// Underlying payload error.
        #[source]
        cause: PayloadError,
    },
    /// The status did not match the expected set.
    #[error("scenario '{scenario}': {}\n{diagnostic}", failure.message)]
    Status {
        /// Scenario name.
        scenario: String,
        /// Classification of the mismatch.
        failure: StatusFailure,
        /// Request and response context.
        diagnostic: Box<Diagnostic>,
    },
    /// An identifier was required but the body is not JSON.
    #[error("scenario '{scenario}': response is not valid JSON\n{diagnostic}")]
    NonJsonResponse {
        /// Scenario name.
        scenario: String,
        /// Request and response context.
        diagnostic: Box<Diagnostic>,
    },
    /// An identifier was required but none was found.
    #[error("scenario '{scenario}': identifier not found in response\n{diagnostic}")]
    IdentifierNotFound {
        /// Scenario name.
        scenario: String,
        /// Request and response context.
        diagnostic: Box<Diagnostic>,
    },
    /// An identifier was found but has the wrong shape.
    #[error(
        "scenario '{scenario}': found id '{identifier}' but it does not match {expected}\n{diagnostic}"
    )]
    IdentifierMalformed {
        /// Scenario name.
        scenario: String,
        /// Identifier as found.
        identifier: String,
        /// Description of the expected shape.
        expected: String,
        /// Request and response context.
        diagnostic: Box<Diagnostic>,
    },
    /// The body did not contain the required text.
    #[error("scenario '{scenario}': response body does not contain '{expected}'\n{diagnostic}")]
    BodyMismatch {
        /// Scenario name.
        scenario: String,
        /// Missing text.
        expected: String,
        /// Request and response context.
        diagnostic: Box<Diagnostic>,
    },
}

impl ScenarioError {
    /// Failure category.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Payload { .. } => FailureKind::MalformedFieldTable,
            Self::Status { failure, .. } => failure.kind,
            Self::NonJsonResponse { .. } => FailureKind::NonJsonResponse,
            Self::IdentifierNotFound { .. } => FailureKind::IdentifierNotFound,
            Self::IdentifierMalformed { .. } => FailureKind::IdentifierMalformed,
            Self::BodyMismatch { .. } => FailureKind::BodyMismatch,
        }
    }

    /// Whether the failure is the retryable conflict that callers may skip.
    #[must_use]
    pub const fn is_inconclusive(&self) -> bool {
        matches!(self.kind(), FailureKind::TransientConflict)
    }

    /// Request and response context, when a request was sent.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::Payload { .. } => None,
            Self::Status { diagnostic, .. }
            | Self::NonJsonResponse { diagnostic, .. }
            | Self::IdentifierNotFound { diagnostic, .. }
            | Self::IdentifierMalformed { diagnostic, .. }
            | Self::BodyMismatch { diagnostic, .. } => Some(diagnostic.as_ref()),
        }
    }
}
