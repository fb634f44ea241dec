//! Response classification: status verdicts, identifier extraction, and
//! body checks.
//!
//! A status that does not match the expected set is always a reported
//! failure with a band-specific diagnostic. The one exception the caller may
//! choose to treat differently is the provisioning backend's "update in
//! progress" conflict, which is flagged as inconclusive.

mod identifier;

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::executor::{ApiOutcome, CONFLICT_SIGNATURE, TransportError};

pub use identifier::{
    ExtractedIdentifier, IdentifierFormat, IdentifierSource, extract_identifier, strategy_names,
};

/// Body fragment returned when the backend rejects a resource definition.
pub const VALIDATION_SIGNATURE: &str = "Invalid VPC/VNet configuration";

/// Failure categories shared by the classifier, the scenario runner, and the
/// bulk orchestrator.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum FailureKind {
    /// The field table had no usable lines or a field could not be coerced.
    MalformedFieldTable,
    /// A bulk request was rejected before any iteration ran.
    InvalidBulkRequest,
    /// Timeout, connection failure, or other transport error (status 0).
    NetworkFailure,
    /// The retryable "another update is in progress" 400.
    TransientConflict,
    /// A 4xx other than the transient conflict.
    ClientError,
    /// A 5xx.
    ServerError,
    /// A status outside the expected set that is neither 4xx nor 5xx.
    UnexpectedStatus,
    /// The body could not be parsed as JSON.
    NonJsonResponse,
    /// No identifier could be recovered from the body.
    IdentifierNotFound,
    /// An identifier was found but has the wrong shape.
    IdentifierMalformed,
    /// A required body substring was missing.
    BodyMismatch,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::MalformedFieldTable => "malformed field table",
            Self::InvalidBulkRequest => "invalid bulk request",
            Self::NetworkFailure => "network failure",
            Self::TransientConflict => "transient conflict",
            Self::ClientError => "client error",
            Self::ServerError => "server error",
            Self::UnexpectedStatus => "unexpected status",
            Self::NonJsonResponse => "non-JSON response",
            Self::IdentifierNotFound => "identifier not found",
            Self::IdentifierMalformed => "identifier malformed",
            Self::BodyMismatch => "body mismatch",
        };
        f.write_str(label)
    }
}

/// Errors raised while inspecting a response body.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ClassifyError {
    /// The body could not be parsed as JSON.
    #[error("response is not valid JSON: {body}")]
    NonJsonResponse {
        /// Raw body.
        body: String,
    },
    /// An identifier was found but does not match the expected format.
    #[error("found id '{identifier}' but it does not match the expected format {expected}")]
    IdentifierMalformed {
        /// Identifier as found.
        identifier: String,
        /// Description of the expected shape.
        expected: String,
    },
}

impl ClassifyError {
    /// Category of this error.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::NonJsonResponse { .. } => FailureKind::NonJsonResponse,
            Self::IdentifierMalformed { .. } => FailureKind::IdentifierMalformed,
        }
    }
}

/// Set of statuses a step accepts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExpectedStatus(BTreeSet<u16>);

impl ExpectedStatus {
    /// Accepts any of `codes`.
    #[must_use]
    pub fn any_of(codes: &[u16]) -> Self {
        Self(codes.iter().copied().collect())
    }

    /// Accepts only `code`.
    #[must_use]
    pub fn only(code: u16) -> Self {
        Self::any_of(&[code])
    }

    /// Whether `status` is accepted.
    #[must_use]
    pub fn contains(&self, status: u16) -> bool {
        self.0.contains(&status)
    }
}

impl fmt::Display for ExpectedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "[{codes}]")
    }
}

/// Why a status did not match.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusFailure {
    /// Category of the failure.
    pub kind: FailureKind,
    /// Status that was received (0 for network failures).
    pub status: u16,
    /// Human-readable explanation keyed by status band.
    pub message: String,
}

/// Outcome of comparing a status against the expected set.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Verdict {
    /// The status matched.
    Pass {
        /// Matching status.
        status: u16,
    },
    /// The status did not match.
    Fail(StatusFailure),
}

impl Verdict {
    /// Whether the status matched.
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass { .. })
    }

    /// Whether the failure is the retryable conflict that callers may skip.
    #[must_use]
    pub fn is_inconclusive(&self) -> bool {
        matches!(self, Self::Fail(failure) if failure.kind == FailureKind::TransientConflict)
    }
}

/// Compares `outcome.status` against `expected` and explains mismatches.
#[must_use]
pub fn classify_status(outcome: &ApiOutcome, expected: &ExpectedStatus) -> Verdict {
    let status = outcome.status;
    if status != 0 && expected.contains(status) {
        return Verdict::Pass { status };
    }
    let (kind, message) = describe_mismatch(outcome, expected);
    Verdict::Fail(StatusFailure {
        kind,
        status,
        message,
    })
}

fn describe_mismatch(outcome: &ApiOutcome, expected: &ExpectedStatus) -> (FailureKind, String) {
    let body = outcome.body.as_str();
    match outcome.status {
        0 => (FailureKind::NetworkFailure, describe_network(outcome)),
        400 if body.contains(CONFLICT_SIGNATURE) => (
            FailureKind::TransientConflict,
            String::from(
                "provisioning stack operation in progress; wait for the current operation to complete and retry",
            ),
        ),
        400 if body.contains(VALIDATION_SIGNATURE) => {
            let details = outcome
                .json
                .as_ref()
                .and_then(|json| json.get("error"))
                .map_or_else(
                    || String::from("no error details provided"),
                    |err| err.as_str().map_or_else(|| err.to_string(), str::to_owned),
                );
            (
                FailureKind::ClientError,
                format!("bad request (400): configuration validation failed: {details}"),
            )
        }
        400 => (
            FailureKind::ClientError,
            format!("bad request (400): invalid resource configuration. Response: {body}"),
        ),
        401 => (
            FailureKind::ClientError,
            String::from("unauthorized (401): check the tenant and organisation headers"),
        ),
        403 => (
            FailureKind::ClientError,
            String::from("forbidden (403): insufficient permissions for this operation"),
        ),
        404 => (
            FailureKind::ClientError,
            String::from("not found (404): API endpoint not found; check the configured path"),
        ),
        409 if body.to_ascii_lowercase().contains("already exists") => (
            FailureKind::ClientError,
            String::from("conflict (409): a resource with this name or configuration already exists"),
        ),
        409 => (
            FailureKind::ClientError,
            format!("conflict (409): naming or resource conflict. Response: {body}"),
        ),
        500 => (
            FailureKind::ServerError,
            format!("internal server error (500): {body}"),
        ),
        code if code >= 500 => (
            FailureKind::ServerError,
            format!("server error ({code}): {body}"),
        ),
        code => (
            if (400..500).contains(&code) {
                FailureKind::ClientError
            } else {
                FailureKind::UnexpectedStatus
            },
            format!("unexpected status {code}, expected {expected}. Response: {body}"),
        ),
    }
}

fn describe_network(outcome: &ApiOutcome) -> String {
    match outcome.error.as_ref() {
        Some(err @ TransportError::Timeout(_)) => format!(
            "{err}. The server may be slow or unresponsive; try a longer timeout"
        ),
        Some(err @ TransportError::Connect(_)) => {
            format!("{err}. Check that the server is running and reachable")
        }
        Some(err @ TransportError::Request(_)) => format!("network error: {err}"),
        None => String::from("network error: no response received"),
    }
}

/// Whether the response body contains `needle` verbatim.
#[must_use]
pub fn body_contains(outcome: &ApiOutcome, needle: &str) -> bool {
    outcome.body.contains(needle)
}
