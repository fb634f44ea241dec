//! BDD step definitions for single provisioning runs.

use mcn_conform::scenario::catalog;
use rstest_bdd_macros::{given, then, when};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use super::test_helpers::{ProvisioningContext, ScenarioOutcome, run_scenario, vpc_fields};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a provisioning API that creates VPC \"{id}\" at the top level")]
fn api_creates_top_level(provisioning_context: ProvisioningContext, id: String) -> ProvisioningContext {
    provisioning_context.api.create_responds(
        201,
        &json!({"id": id, "message": "VPC created successfully"}),
    );
    provisioning_context
}

#[given("a provisioning API that creates VPC \"{id}\" under data")]
fn api_creates_nested(provisioning_context: ProvisioningContext, id: String) -> ProvisioningContext {
    provisioning_context
        .api
        .create_responds(201, &json!({"data": {"vpcId": id}}));
    provisioning_context
}

#[given("a provisioning API that returns an empty JSON object")]
fn api_returns_empty_object(provisioning_context: ProvisioningContext) -> ProvisioningContext {
    provisioning_context.api.create_responds(201, &json!({}));
    provisioning_context
}

#[given("a provisioning API that reports one update in progress before creating VPC \"{id}\"")]
fn api_conflicts_once(provisioning_context: ProvisioningContext, id: String) -> ProvisioningContext {
    provisioning_context.api.conflict_times(1);
    provisioning_context
        .api
        .create_responds(201, &json!({"id": id}));
    provisioning_context
}

#[given("a provisioning API that always reports an update in progress")]
fn api_always_conflicts(provisioning_context: ProvisioningContext) -> ProvisioningContext {
    provisioning_context.api.conflict_times(u64::MAX);
    provisioning_context
}

#[given("a provisioning API that deletes VPC \"{id}\"")]
fn api_deletes(provisioning_context: ProvisioningContext, id: String) -> ProvisioningContext {
    provisioning_context.api.mount(
        Mock::given(method("DELETE"))
            .and(path(format!("/cloud/vpc/{id}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": "VPC deleted successfully"})),
            ),
    );
    provisioning_context
}

#[when("I create a VPC with CIDR \"{cidr}\" and tag \"{tag}\"")]
fn create_vpc(
    mut provisioning_context: ProvisioningContext,
    cidr: String,
    tag: String,
) -> ProvisioningContext {
    let scenario = catalog::create_vpc(vpc_fields(&cidr, &tag));
    provisioning_context.outcome = Some(run_scenario(&provisioning_context, &scenario));
    provisioning_context
}

#[when("I delete VPC \"{id}\"")]
fn delete_vpc(mut provisioning_context: ProvisioningContext, id: String) -> ProvisioningContext {
    let runner = provisioning_context.api.runner();
    let scenario = catalog::delete_vpc(id, runner.config());
    provisioning_context.outcome = Some(run_scenario(&provisioning_context, &scenario));
    provisioning_context
}

fn passed(context: &ProvisioningContext) -> Result<&mcn_conform::ScenarioReport, StepError> {
    match context.outcome.as_ref() {
        Some(ScenarioOutcome::Passed(report)) => Ok(report),
        Some(ScenarioOutcome::Failed { message, .. }) => Err(StepError::Assertion(format!(
            "expected success, got failure: {message}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[then("the scenario passes with status {status:u16}")]
fn scenario_passes(provisioning_context: &ProvisioningContext, status: u16) -> Result<(), StepError> {
    let report = passed(provisioning_context)?;
    if report.status == status {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected status {status}, got {}",
            report.status
        )))
    }
}

#[then("the recovered identifier is \"{id}\"")]
fn recovered_identifier(
    provisioning_context: &ProvisioningContext,
    id: String,
) -> Result<(), StepError> {
    let report = passed(provisioning_context)?;
    if report.identifier() == Some(id.as_str()) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected identifier {id}, got {:?}",
            report.identifier
        )))
    }
}

#[then("the identifier came from \"{source}\"")]
fn identifier_source(
    provisioning_context: &ProvisioningContext,
    source: String,
) -> Result<(), StepError> {
    let report = passed(provisioning_context)?;
    let actual = report
        .identifier
        .as_ref()
        .map(|extracted| extracted.source.to_string());
    if actual.as_deref() == Some(source.as_str()) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected source {source}, got {actual:?}"
        )))
    }
}

#[then("the API received tag \"{tag}\" under tags only")]
fn tag_under_tags(provisioning_context: &ProvisioningContext, tag: String) -> Result<(), StepError> {
    let requests = provisioning_context.api.create_requests();
    let request = requests
        .first()
        .ok_or_else(|| StepError::Assertion(String::from("no create request received")))?;
    let body: Value = request
        .body_json()
        .map_err(|err| StepError::Assertion(format!("create body is not JSON: {err}")))?;
    if body.get("tagName").is_some() {
        return Err(StepError::Assertion(format!(
            "tagName leaked to the top level: {body}"
        )));
    }
    if body.pointer("/tags/Name") == Some(&Value::from(tag.as_str())) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected tags.Name {tag}, got {body}"
        )))
    }
}

#[then("the API received {count:usize} create requests")]
fn create_request_count(
    provisioning_context: &ProvisioningContext,
    count: usize,
) -> Result<(), StepError> {
    let received = provisioning_context.api.create_requests().len();
    if received == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} create requests, got {received}"
        )))
    }
}

#[then("the scenario fails with \"{kind}\"")]
fn scenario_fails(provisioning_context: &ProvisioningContext, kind: String) -> Result<(), StepError> {
    match provisioning_context.outcome.as_ref() {
        Some(ScenarioOutcome::Failed { kind: actual, .. }) if actual.to_string() == kind => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected failure '{kind}', got {other:?}"
        ))),
    }
}

#[then("the failure is inconclusive")]
fn failure_inconclusive(provisioning_context: &ProvisioningContext) -> Result<(), StepError> {
    match provisioning_context.outcome.as_ref() {
        Some(ScenarioOutcome::Failed {
            inconclusive: true, ..
        }) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected an inconclusive failure, got {other:?}"
        ))),
    }
}
