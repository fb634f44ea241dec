//! Wiremock-backed provisioning API shared by behavioural tests.
//!
//! Integration tests are compiled as separate crates (one per top-level file
//! in `tests/`), so this module is pulled in with:
//!
//! ```rust
//! #[path = "common/mock_api.rs"]
//! mod mock_api;
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use mcn_conform::test_support::harness_config;
use mcn_conform::{RequestExecutor, ReqwestTransport, RetryPolicy, ScenarioRunner};
use serde_json::Value;
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Body the backend returns while another stack update holds the lock.
pub const CONFLICT_BODY: &str =
    r#"{"message":"Stack busy","error":"Another update is currently in progress"}"#;

/// Path the default configuration posts VPCs to.
pub const VPC_CREATE_PATH: &str = "/cloud/vpc";

/// A running mock API plus the runtime used to drive it from sync steps.
#[derive(Clone, Debug)]
pub struct MockApi {
    runtime: Arc<Runtime>,
    server: Arc<MockServer>,
}

impl MockApi {
    pub fn start() -> Self {
        let runtime = Runtime::new().unwrap_or_else(|err| panic!("create tokio runtime: {err}"));
        let server = runtime.block_on(MockServer::start());
        Self {
            runtime: Arc::new(runtime),
            server: Arc::new(server),
        }
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn mount(&self, mock: Mock) {
        self.block_on(mock.mount(&self.server));
    }

    /// Answers every VPC create with `status` and a JSON `body`.
    pub fn create_responds(&self, status: u16, body: &Value) {
        self.mount(
            Mock::given(method("POST"))
                .and(path(VPC_CREATE_PATH))
                .respond_with(ResponseTemplate::new(status).set_body_json(body)),
        );
    }

    /// Answers the next `times` VPC creates with the conflict body.
    pub fn conflict_times(&self, times: u64) {
        self.mount(
            Mock::given(method("POST"))
                .and(path(VPC_CREATE_PATH))
                .respond_with(ResponseTemplate::new(400).set_body_string(CONFLICT_BODY))
                .up_to_n_times(times)
                .with_priority(1),
        );
    }

    pub fn received(&self) -> Vec<Request> {
        self.block_on(self.server.received_requests())
            .unwrap_or_default()
    }

    /// Requests sent to the VPC create path.
    pub fn create_requests(&self) -> Vec<Request> {
        self.received()
            .into_iter()
            .filter(|request| {
                request.method.as_str() == "POST" && request.url.path() == VPC_CREATE_PATH
            })
            .collect()
    }

    /// Runner pointed at this server with zero retry backoff.
    pub fn runner(&self) -> ScenarioRunner<ReqwestTransport> {
        let transport = ReqwestTransport::new(Duration::from_secs(5), Duration::from_secs(10))
            .unwrap_or_else(|err| panic!("build reqwest transport: {err}"));
        let policy = RetryPolicy::default()
            .with_max_attempts(2)
            .with_backoff(Duration::ZERO, Duration::ZERO);
        ScenarioRunner::new(
            RequestExecutor::new(transport, policy),
            harness_config(&self.server.uri()),
        )
    }
}
