//! Conformance harness for multi-cloud network provisioning APIs.
//!
//! The crate drives VPC and subnet lifecycle scenarios against a provisioning
//! HTTP API: it builds request payloads from `key=value` field tables, sends
//! them with bounded retry for known transient failures, classifies the
//! response, and recovers the identifiers of created resources. Bulk runs
//! repeat one create scenario across planned parameter sets, and the sweeper
//! deletes what a run left behind.

pub mod bulk;
pub mod classify;
pub mod config;
pub mod executor;
pub mod payload;
pub mod scenario;
pub mod sweep;
pub mod test_support;

pub use bulk::{
    BulkError, BulkOrchestrator, BulkRequest, BulkResult, BulkRun, BulkTarget, IterationStatus,
    ParameterSet,
};
pub use classify::{
    ExpectedStatus, ExtractedIdentifier, FailureKind, IdentifierFormat, IdentifierSource, Verdict,
};
pub use config::{ConfigError, HarnessConfig};
pub use executor::{
    ApiOutcome, ApiRequest, HttpMethod, RequestExecutor, ReqwestTransport, RetryPolicy,
    Transport, TransportError,
};
pub use payload::{FieldTable, PayloadBuilder, PayloadError, PriorContext, RequestPayload};
pub use scenario::{
    BulkParameters, Diagnostic, HealthStatus, IdentifierExpectation, Operation, Scenario,
    ScenarioContext, ScenarioError, ScenarioReport, ScenarioRunner,
};
pub use sweep::{ResourceKind, SweepFailure, SweepSummary, Sweeper};
