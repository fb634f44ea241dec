//! BDD step definitions for bulk runs.

use std::collections::HashSet;

use mcn_conform::{BulkRequest, BulkRun, IterationStatus};
use rstest_bdd_macros::{given, then, when};
use serde_json::json;

use super::test_helpers::{BulkContext, BulkOutcome, cidrs, run_bulk};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a provisioning API that creates VPC \"{id}\" at the top level")]
fn api_creates(bulk_context: BulkContext, id: String) -> BulkContext {
    bulk_context.api.create_responds(201, &json!({"id": id}));
    bulk_context
}

#[given("a provisioning API that fails every create with status {status:u16}")]
fn api_fails(bulk_context: BulkContext, status: u16) -> BulkContext {
    bulk_context
        .api
        .create_responds(status, &json!({"message": "internal failure"}));
    bulk_context
}

#[when("I bulk create {count:usize} VPCs")]
fn bulk_create(mut bulk_context: BulkContext, count: usize) -> BulkContext {
    let request = BulkRequest::vpc(count, cidrs(count));
    bulk_context.outcome = Some(run_bulk(&bulk_context, &request));
    bulk_context
}

#[when("I bulk create VPCs with a count of {count:usize} but only {available:usize} CIDR blocks")]
fn bulk_create_short(mut bulk_context: BulkContext, count: usize, available: usize) -> BulkContext {
    let request = BulkRequest::vpc(count, cidrs(available));
    bulk_context.outcome = Some(run_bulk(&bulk_context, &request));
    bulk_context
}

fn completed(context: &BulkContext) -> Result<&BulkRun, StepError> {
    match context.outcome.as_ref() {
        Some(BulkOutcome::Completed(run)) => Ok(run),
        Some(BulkOutcome::Rejected(message)) => Err(StepError::Assertion(format!(
            "expected a completed run, got rejection: {message}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[then("{count:usize} iterations passed")]
fn iterations_passed(bulk_context: &BulkContext, count: usize) -> Result<(), StepError> {
    let run = completed(bulk_context)?;
    let passed = run
        .results
        .iter()
        .filter(|result| result.status == IterationStatus::Passed)
        .count();
    if passed == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} passed iterations, got {passed}: {:?}",
            run.results
        )))
    }
}

#[then("every iteration used a unique name")]
fn unique_names(bulk_context: &BulkContext) -> Result<(), StepError> {
    let run = completed(bulk_context)?;
    let names: HashSet<_> = run
        .parameter_sets
        .iter()
        .flat_map(|set| [set.resource_name.as_str(), set.stack_name.as_str()])
        .collect();
    if names.len() == run.parameter_sets.len() * 2 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "duplicate names in {:?}",
            run.parameter_sets
        )))
    }
}

#[then("{count:usize} identifiers were recorded for cleanup")]
fn identifiers_recorded(bulk_context: &BulkContext, count: usize) -> Result<(), StepError> {
    let recorded = completed(bulk_context)?.identifiers().len();
    if recorded == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} identifiers, got {recorded}"
        )))
    }
}

#[then("the run recorded {count:usize} iterations")]
fn iterations_recorded(bulk_context: &BulkContext, count: usize) -> Result<(), StepError> {
    let recorded = completed(bulk_context)?.results.len();
    if recorded == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} results, got {recorded}"
        )))
    }
}

#[then("the bulk request is rejected")]
fn request_rejected(bulk_context: &BulkContext) -> Result<(), StepError> {
    match bulk_context.outcome.as_ref() {
        Some(BulkOutcome::Rejected(message)) if message.contains("invalid bulk request") => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected a rejected request, got {other:?}"
        ))),
    }
}

#[then("the API received no requests")]
fn no_requests(bulk_context: &BulkContext) -> Result<(), StepError> {
    let received = bulk_context.api.received().len();
    if received == 0 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no requests, got {received}"
        )))
    }
}
