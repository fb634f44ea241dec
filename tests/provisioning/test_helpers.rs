//! Shared fixtures and helpers for provisioning BDD scenarios.

use mcn_conform::{FailureKind, Scenario, ScenarioReport};
use rstest::fixture;

use crate::mock_api::MockApi;

#[derive(Clone, Debug)]
pub enum ScenarioOutcome {
    Passed(ScenarioReport),
    Failed {
        kind: FailureKind,
        inconclusive: bool,
        message: String,
    },
}

#[derive(Clone, Debug)]
pub struct ProvisioningContext {
    pub api: MockApi,
    pub outcome: Option<ScenarioOutcome>,
}

#[fixture]
pub fn provisioning_context() -> ProvisioningContext {
    ProvisioningContext {
        api: MockApi::start(),
        outcome: None,
    }
}

pub fn vpc_fields(cidr: &str, tag: &str) -> String {
    format!(
        "cidrBlock={cidr}\ncloudAccountId=1\ncloudProvider=aws\ncloudRegion=us-east-1\n\
         cloudResourceGroup=\ntagName={tag}"
    )
}

pub fn run_scenario(context: &ProvisioningContext, scenario: &Scenario) -> ScenarioOutcome {
    let runner = context.api.runner();
    match context.api.block_on(runner.run(scenario, None)) {
        Ok(report) => ScenarioOutcome::Passed(report),
        Err(err) => ScenarioOutcome::Failed {
            kind: err.kind(),
            inconclusive: err.is_inconclusive(),
            message: err.to_string(),
        },
    }
}
