//! Per-instance state threaded through the steps of one scenario.

use crate::executor::ApiOutcome;
use crate::payload::{PriorContext, REGION_KEY, RequestPayload};

/// State owned by a single scenario instance. A new context is created for
/// every run and never shared between runs.
#[derive(Clone, Debug, PartialEq)]
pub struct ScenarioContext {
    /// Values carried between steps, such as the account id and region.
    pub prior: PriorContext,
    /// Payload built by the `given` step.
    pub payload: Option<RequestPayload>,
    /// Outcome of the `when` step.
    pub outcome: Option<ApiOutcome>,
    /// Identifier recovered by the `then` steps.
    pub identifier: Option<String>,
}

impl ScenarioContext {
    /// Creates a context seeded with the configured account and region.
    #[must_use]
    pub fn new(account_id: i64, region: &str) -> Self {
        Self {
            prior: PriorContext::new(account_id).with_value(REGION_KEY, region),
            payload: None,
            outcome: None,
            identifier: None,
        }
    }

    /// Region chosen for this instance.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.prior.region()
    }
}
