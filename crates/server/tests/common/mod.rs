//! Common test utilities for in-process API testing.
//!
//! This module provides a test fixture that builds the router around a real
//! orchestrator with a mock (or injected) fetcher, so the HTTP surface can be
//! exercised without network access.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use fetchpack_core::{
    testing::MockFetcher, Config, Fetcher, OrchestratorConfig, ServerConfig, TaskOrchestrator,
    ZipArchiver,
};

/// Test fixture for API testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_task_creation() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/tasks", json!({})).await;
///
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// The orchestrator behind the router
    pub orchestrator: Arc<TaskOrchestrator>,
    /// Mock fetcher - configure per-URL failures (unused with a custom fetcher)
    pub fetcher: Arc<MockFetcher>,
    /// Work directory for downloads and archives
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Raw response, for binary bodies
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
}

impl TestFixture {
    /// Create a new test fixture with default limits.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom limits and the mock fetcher.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let fetcher = Arc::new(MockFetcher::new());
        Self::build(test_config, Arc::clone(&fetcher) as Arc<dyn Fetcher>, fetcher)
    }

    /// Create a test fixture around a custom fetcher (e.g. a real HttpFetcher).
    pub async fn with_fetcher(test_config: TestConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self::build(test_config, fetcher, Arc::new(MockFetcher::new()))
    }

    fn build(test_config: TestConfig, fetcher: Arc<dyn Fetcher>, mock: Arc<MockFetcher>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            orchestrator: OrchestratorConfig {
                max_tasks: test_config.max_tasks,
                max_files: test_config.max_files,
                cleanup_delay_secs: test_config.cleanup_delay_secs,
                work_dir: temp_dir.path().to_path_buf(),
                ..Default::default()
            },
            ..Default::default()
        };

        let orchestrator = Arc::new(TaskOrchestrator::new(
            config.orchestrator.clone(),
            fetcher,
            Arc::new(ZipArchiver::new()),
        ));

        let state = Arc::new(fetchpack_server::state::AppState::new(
            config,
            Arc::clone(&orchestrator),
        ));
        let router = fetchpack_server::api::create_router(state);

        Self {
            router,
            orchestrator,
            fetcher: mock,
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

        let raw = self.send(request).await;
        TestResponse {
            status: raw.status,
            body: parse_json(&raw.bytes),
        }
    }

    /// Send a GET request and keep the body as bytes.
    pub async fn get_raw(&self, path: &str) -> RawResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Create a task and return its id.
    pub async fn create_task(&self, urls: &[&str]) -> String {
        let response = self
            .post("/api/v1/tasks", serde_json::json!({ "urls": urls }))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["task_id"]
            .as_str()
            .expect("task_id should be a string")
            .to_string()
    }

    /// Poll a task until it reaches `status` or the timeout expires.
    pub async fn wait_for_status(&self, task_id: &str, status: &str, timeout: Duration) -> Value {
        let start = std::time::Instant::now();
        loop {
            let response = self.get(&format!("/api/v1/tasks/{}", task_id)).await;
            if response.body["status"] == status {
                return response.body;
            }
            if start.elapsed() > timeout {
                panic!(
                    "Task {} did not reach {} in time, last response: {}",
                    task_id, status, response.body
                );
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
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

        let request = request_builder.body(body).unwrap();
        let raw = self.send(request).await;

        TestResponse {
            status: raw.status,
            body: parse_json(&raw.bytes),
        }
    }

    async fn send(&self, request: Request<Body>) -> RawResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        RawResponse {
            status,
            headers,
            bytes,
        }
    }
}

fn parse_json(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(bytes).unwrap_or(Value::Null)
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub max_tasks: usize,
    pub max_files: usize,
    pub cleanup_delay_secs: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            max_tasks: 3,
            max_files: 3,
            cleanup_delay_secs: 3600,
        }
    }
}

impl TestConfig {
    /// Config with a short cleanup delay for retention tests.
    pub fn with_quick_cleanup() -> Self {
        Self {
            cleanup_delay_secs: 1,
            ..Default::default()
        }
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
