//! BDD scenarios for single provisioning runs.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ProvisioningContext, provisioning_context};

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Create a VPC and recover its identifier"
)]
fn scenario_create_vpc(provisioning_context: ProvisioningContext) {
    let _ = provisioning_context;
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Recover an identifier nested under data"
)]
fn scenario_nested_identifier(provisioning_context: ProvisioningContext) {
    let _ = provisioning_context;
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "An empty body does not yield an identifier"
)]
fn scenario_empty_body(provisioning_context: ProvisioningContext) {
    let _ = provisioning_context;
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "A transient conflict is retried"
)]
fn scenario_conflict_retried(provisioning_context: ProvisioningContext) {
    let _ = provisioning_context;
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "A persistent conflict is inconclusive"
)]
fn scenario_conflict_inconclusive(provisioning_context: ProvisioningContext) {
    let _ = provisioning_context;
}

#[scenario(path = "tests/features/provisioning.feature", name = "Delete a VPC")]
fn scenario_delete_vpc(provisioning_context: ProvisioningContext) {
    let _ = provisioning_context;
}
