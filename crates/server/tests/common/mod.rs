//! Common test utilities for in-process API testing with mocks.
//!
//! The fixture builds the real router over an orchestrator whose host tools
//! and audio pipeline are mocked, so no radio hardware is needed.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use sigint_core::{
    testing::{MockAudioBackend, MockRunner},
    Config, DiscoveredSignal, DiscoveryCallback, GpsFix, IngestConfig, Medium,
    SignalOrchestrator,
};
use sigint_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use sigint_core::testing::fixtures;

/// Test fixture driving the router in-process.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() {
///     let fixture = TestFixture::new().await;
///     let response = fixture.get("/api/v1/health").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Orchestrator behind the router
    pub orchestrator: Arc<SignalOrchestrator>,
    /// Mock host tools - control availability and output
    pub runner: MockRunner,
    /// Mock audio pipeline - inspect spawned plans, simulate exits
    pub backend: MockAudioBackend,
    /// Temporary directory holding the node identity
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Fixture whose host has every tool installed.
    pub async fn new() -> Self {
        Self::with_runner(fixtures::fully_equipped_runner().await).await
    }

    /// Fixture with no tools installed.
    pub async fn bare() -> Self {
        Self::with_runner(MockRunner::new()).await
    }

    /// Fixture over a custom runner.
    pub async fn with_runner(runner: MockRunner) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = Config::default();
        config.node.identity_path = temp_dir.path().join("node.json");
        config.node.name = Some("api-test".to_string());
        config.scanner.sdr_bands.truncate(1);
        config.ingest = Some(IngestConfig {
            url: "http://collector.invalid".to_string(),
            api_key: "secret-ingest-key".to_string(),
            batch_size: 50,
            flush_interval_ms: 5000,
            timeout_secs: 10,
        });

        let backend = MockAudioBackend::new();
        let callback: DiscoveryCallback =
            Arc::new(|_: &DiscoveredSignal, _: Medium, _: Option<&GpsFix>| {});
        let orchestrator = Arc::new(SignalOrchestrator::new(
            config.clone(),
            Arc::new(runner.clone()),
            Arc::new(backend.clone()),
            callback,
        ));

        let state = Arc::new(AppState::new(config, Arc::clone(&orchestrator)));
        let router = create_router(state);

        Self {
            router,
            orchestrator,
            runner,
            backend,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
