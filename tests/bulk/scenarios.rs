//! BDD scenarios for bulk runs.

use rstest_bdd_macros::scenario;

use super::test_helpers::{BulkContext, bulk_context};

#[scenario(
    path = "tests/features/bulk.feature",
    name = "Every iteration gets a unique name and records its identifier"
)]
fn scenario_unique_names(bulk_context: BulkContext) {
    let _ = bulk_context;
}

#[scenario(
    path = "tests/features/bulk.feature",
    name = "Too few CIDR blocks are rejected before any request"
)]
fn scenario_rejected_before_requests(bulk_context: BulkContext) {
    let _ = bulk_context;
}

#[scenario(
    path = "tests/features/bulk.feature",
    name = "A failing iteration does not stop the run"
)]
fn scenario_failures_continue(bulk_context: BulkContext) {
    let _ = bulk_context;
}
