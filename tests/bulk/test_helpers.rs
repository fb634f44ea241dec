//! Shared fixtures for bulk BDD scenarios.

use std::time::Duration;

use mcn_conform::{BulkOrchestrator, BulkRequest, BulkRun};
use rstest::fixture;

use crate::mock_api::MockApi;

#[derive(Clone, Debug)]
pub enum BulkOutcome {
    Completed(BulkRun),
    Rejected(String),
}

#[derive(Clone, Debug)]
pub struct BulkContext {
    pub api: MockApi,
    pub outcome: Option<BulkOutcome>,
}

#[fixture]
pub fn bulk_context() -> BulkContext {
    BulkContext {
        api: MockApi::start(),
        outcome: None,
    }
}

pub fn cidrs(count: usize) -> Vec<String> {
    (0..count).map(|index| format!("10.{index}.0.0/16")).collect()
}

pub fn run_bulk(context: &BulkContext, request: &BulkRequest) -> BulkOutcome {
    let runner = context.api.runner();
    let orchestrator = BulkOrchestrator::new(&runner).with_delay(Duration::ZERO);
    match context.api.block_on(orchestrator.run(request)) {
        Ok(run) => BulkOutcome::Completed(run),
        Err(err) => BulkOutcome::Rejected(err.to_string()),
    }
}
