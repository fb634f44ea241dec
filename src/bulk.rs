//! Repeated execution of one create scenario across planned parameter sets.
//!
//! Every parameter set is generated before the first request so a bad
//! request is rejected without touching the API. Iterations run strictly in
//! sequence with a fixed pause between them, and a failed iteration never
//! stops the run.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::classify::{FailureKind, extract_identifier};
use crate::executor::Transport;
use crate::scenario::{BulkParameters, Operation, ScenarioError, ScenarioRunner, catalog};

/// Default pause between iterations.
pub const DEFAULT_ITERATION_DELAY: Duration = Duration::from_secs(1);

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const MIN_INDEX_WIDTH: usize = 2;

/// Resource a bulk run creates.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BulkTarget {
    /// Create VPCs.
    Vpc,
    /// Create subnets inside an existing VPC.
    Subnet {
        /// Parent VPC id.
        vpc_id: String,
    },
}

impl BulkTarget {
    const fn operation(&self) -> Operation {
        match self {
            Self::Vpc => Operation::CreateVpc,
            Self::Subnet { .. } => Operation::CreateSubnet,
        }
    }

    fn parent_id(&self) -> Option<String> {
        match self {
            Self::Vpc => None,
            Self::Subnet { vpc_id } => Some(vpc_id.clone()),
        }
    }
}

/// Input to a bulk run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BulkRequest {
    /// Number of iterations.
    pub count: usize,
    /// One CIDR block per iteration, consumed in order.
    pub primary_values: Vec<String>,
    /// Prefix for generated resource names.
    pub name_prefix: String,
    /// Prefix for generated stack names.
    pub stack_prefix: String,
    /// Resource to create.
    pub target: BulkTarget,
}

impl BulkRequest {
    /// VPC run with the default `bulk-vpc` and `bulk-stack` prefixes.
    #[must_use]
    pub fn vpc(count: usize, cidrs: Vec<String>) -> Self {
        Self {
            count,
            primary_values: cidrs,
            name_prefix: String::from("bulk-vpc"),
            stack_prefix: String::from("bulk-stack"),
            target: BulkTarget::Vpc,
        }
    }

    /// Subnet run with the default `bulk-subnet` and `bulk-subnet-stack`
    /// prefixes.
    #[must_use]
    pub fn subnet(vpc_id: impl Into<String>, count: usize, cidrs: Vec<String>) -> Self {
        Self {
            count,
            primary_values: cidrs,
            name_prefix: String::from("bulk-subnet"),
            stack_prefix: String::from("bulk-subnet-stack"),
            target: BulkTarget::Subnet {
                vpc_id: vpc_id.into(),
            },
        }
    }

    /// Overrides the name and stack prefixes.
    #[must_use]
    pub fn prefixes(mut self, name: impl Into<String>, stack: impl Into<String>) -> Self {
        self.name_prefix = name.into();
        self.stack_prefix = stack.into();
        self
    }

    fn validate(&self) -> Result<(), BulkError> {
        if self.count == 0 {
            return Err(BulkError::InvalidBulkRequest(String::from(
                "count must be at least 1",
            )));
        }
        if self.count > self.primary_values.len() {
            return Err(BulkError::InvalidBulkRequest(format!(
                "count {} exceeds the {} CIDR block(s) supplied",
                self.count,
                self.primary_values.len()
            )));
        }
        if self
            .primary_values
            .iter()
            .take(self.count)
            .any(|value| value.trim().is_empty())
        {
            return Err(BulkError::InvalidBulkRequest(String::from(
                "CIDR blocks must not be blank",
            )));
        }
        if let BulkTarget::Subnet { vpc_id } = &self.target {
            if !vpc_id.starts_with("vpc-") {
                return Err(BulkError::InvalidBulkRequest(format!(
                    "parent VPC id '{vpc_id}' must start with 'vpc-'"
                )));
            }
        }
        Ok(())
    }
}

/// Errors that stop a bulk run before any iteration.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum BulkError {
    /// The request failed a precondition.
    #[error("invalid bulk request: {0}")]
    InvalidBulkRequest(String),
}

impl BulkError {
    /// Failure category.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidBulkRequest(_) => FailureKind::InvalidBulkRequest,
        }
    }
}

/// Generated names and value for one iteration.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ParameterSet {
    /// Unique resource name.
    pub resource_name: String,
    /// Unique stack name.
    pub stack_name: String,
    /// CIDR block.
    pub primary_value: String,
    /// Run timestamp shared by every set.
    pub generated_at: DateTime<Utc>,
}

/// How one iteration ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum IterationStatus {
    /// Every scenario step passed.
    Passed,
    /// A step failed.
    Failed,
    /// The backend reported a transient conflict after retries.
    Inconclusive,
}

/// Per-iteration result.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct BulkResult {
    /// Resource name used.
    pub name: String,
    /// Outcome.
    pub status: IterationStatus,
    /// Identifier recovered for cleanup, even when the iteration failed.
    pub identifier: Option<String>,
    /// One-line summary or the full failure diagnostic.
    pub diagnostic: String,
}

/// Record of a completed bulk run.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct BulkRun {
    /// Run timestamp (`%Y%m%d%H%M%S`).
    pub timestamp: String,
    /// Iterations requested.
    pub requested_count: usize,
    /// Planned parameter sets, in order.
    pub parameter_sets: Vec<ParameterSet>,
    /// Results, in iteration order.
    pub results: Vec<BulkResult>,
}

impl BulkRun {
    /// Identifiers recorded for cleanup.
    #[must_use]
    pub fn identifiers(&self) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|result| result.identifier.clone())
            .collect()
    }

    /// Number of iterations that passed.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.results
            .iter()
            .filter(|result| result.status == IterationStatus::Passed)
            .count()
    }

    /// Whether every iteration passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.passed() == self.results.len()
    }
}

/// Plans parameter sets for `request` at `at`.
///
/// Names follow `{prefix}-{timestamp}-{index}` where `index` counts from
/// zero and is padded to the width of the last index (at least two digits),
/// so names sort in iteration order.
///
/// # Errors
///
/// Returns [`BulkError::InvalidBulkRequest`] when a precondition fails.
pub fn plan(request: &BulkRequest, at: DateTime<Utc>) -> Result<Vec<ParameterSet>, BulkError> {
    request.validate()?;
    let timestamp = at.format(TIMESTAMP_FORMAT).to_string();
    let width = request
        .count
        .saturating_sub(1)
        .to_string()
        .len()
        .max(MIN_INDEX_WIDTH);
    Ok(request
        .primary_values
        .iter()
        .take(request.count)
        .enumerate()
        .map(|(index, value)| {
            ParameterSet {
                resource_name: format!("{}-{timestamp}-{index:0width$}", request.name_prefix),
                stack_name: format!("{}-{timestamp}-{index:0width$}", request.stack_prefix),
                primary_value: value.trim().to_owned(),
                generated_at: at,
            }
        })
        .collect())
}

/// Drives a bulk run through a [`ScenarioRunner`].
#[derive(Debug)]
pub struct BulkOrchestrator<'a, T> {
    runner: &'a ScenarioRunner<T>,
    delay: Duration,
}

impl<'a, T: Transport> BulkOrchestrator<'a, T> {
    /// Creates an orchestrator with the default inter-iteration delay.
    #[must_use]
    pub const fn new(runner: &'a ScenarioRunner<T>) -> Self {
        Self {
            runner,
            delay: DEFAULT_ITERATION_DELAY,
        }
    }

    /// Overrides the inter-iteration delay.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Runs `request` using the current time as the run timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`BulkError`] when the request is rejected before any call.
    pub async fn run(&self, request: &BulkRequest) -> Result<BulkRun, BulkError> {
        self.run_at(request, Utc::now()).await
    }

    /// Runs `request` with an explicit run timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`BulkError`] when the request is rejected before any call.
    pub async fn run_at(
        &self,
        request: &BulkRequest,
        at: DateTime<Utc>,
    ) -> Result<BulkRun, BulkError> {
        let parameter_sets = plan(request, at)?;
        let scenario = catalog::bulk_create(request.target.operation());
        let parent_id = request.target.parent_id();
        info!(
            count = request.count,
            scenario = %scenario.name,
            "starting bulk run"
        );

        let mut results = Vec::with_capacity(parameter_sets.len());
        for (offset, set) in parameter_sets.iter().enumerate() {
            let iteration = offset + 1;
            info!(
                iteration,
                total = parameter_sets.len(),
                name = %set.resource_name,
                cidr = %set.primary_value,
                "bulk iteration"
            );
            let params = BulkParameters {
                resource_name: set.resource_name.clone(),
                stack_name: set.stack_name.clone(),
                primary_value: set.primary_value.clone(),
                parent_id: parent_id.clone(),
            };
            let result = match self.runner.run(&scenario, Some(&params)).await {
                Ok(report) => BulkResult {
                    name: set.resource_name.clone(),
                    status: IterationStatus::Passed,
                    identifier: report.identifier().map(str::to_owned),
                    diagnostic: format!("status {}", report.status),
                },
                Err(err) => failed_result(&set.resource_name, &err),
            };
            results.push(result);

            if iteration < parameter_sets.len() && !self.delay.is_zero() {
                sleep(self.delay).await;
            }
        }

        let run = BulkRun {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            requested_count: request.count,
            parameter_sets,
            results,
        };
        info!(
            passed = run.passed(),
            total = run.results.len(),
            identifiers = run.identifiers().len(),
            "bulk run complete"
        );
        Ok(run)
    }
}

fn failed_result(name: &str, err: &ScenarioError) -> BulkResult {
    let status = if err.is_inconclusive() {
        IterationStatus::Inconclusive
    } else {
        IterationStatus::Failed
    };
    let identifier = err
        .diagnostic()
        .and_then(|diagnostic| extract_identifier(&diagnostic.outcome).ok())
        .and_then(|extracted| extracted.found().map(str::to_owned));
    match &identifier {
        Some(id) => warn!(%name, %id, "iteration failed but created a resource; recorded for cleanup"),
        None => warn!(%name, kind = %err.kind(), "iteration failed"),
    }
    BulkResult {
        name: name.to_owned(),
        status,
        identifier,
        diagnostic: err.to_string(),
    }
}
