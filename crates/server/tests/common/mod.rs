//! Common test utilities for in-process API testing.
//!
//! This module provides a test fixture that builds the router around a
//! [`MockFetcher`], with vocabulary and locator files in a temp directory,
//! so the API can be exercised without network access.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use firefly_core::{
    config::{RunConfig, SourcesConfig},
    testing::{MockFetcher, RecordingObserver},
    Config, CounterConfig, FetchConfig, FireflyApp, ServerConfig,
};

/// Test fixture for API testing with a mock fetcher.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_top_words() {
///     let fixture = TestFixture::new(&["alpha"], &[("http://a.com/1", "alpha")]);
///     let response = fixture.get("/api/v1/top-words?n=1").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock fetcher - configure documents, errors and delays
    pub fetcher: Arc<MockFetcher>,
    /// Records pipeline notifications
    pub observer: Arc<RecordingObserver>,
    /// Cancelled to simulate server shutdown
    pub shutdown: CancellationToken,
    /// Temporary directory holding the source files
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture with the given vocabulary and `(locator, text)` documents.
    pub fn new(vocabulary: &[&str], documents: &[(&str, &str)]) -> Self {
        Self::with_run_config(vocabulary, documents, RunConfig::default())
    }

    /// Create a fixture with custom run settings.
    pub fn with_run_config(
        vocabulary: &[&str],
        documents: &[(&str, &str)],
        run: RunConfig,
    ) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let vocabulary_path = write_lines(&temp_dir, "words.txt", vocabulary.iter().copied());
        let locators_path = write_lines(
            &temp_dir,
            "urls.txt",
            documents.iter().map(|(locator, _)| *locator),
        );

        let fetcher = Arc::new(MockFetcher::new());
        for (locator, text) in documents {
            fetcher.set_document(locator, text);
        }
        let observer = Arc::new(RecordingObserver::new());

        let config = Config {
            sources: SourcesConfig {
                vocabulary: vocabulary_path,
                locators: locators_path,
            },
            counter: CounterConfig {
                workers: 2,
                ..Default::default()
            },
            fetch: FetchConfig::default(),
            run,
            server: Some(ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 8080, // Not used for in-process testing
            }),
        };

        let app = FireflyApp::with_fetcher(
            config,
            Arc::clone(&fetcher) as Arc<dyn firefly_core::DocumentFetcher>,
            Arc::clone(&observer) as Arc<dyn firefly_core::PipelineObserver>,
        );
        let shutdown = CancellationToken::new();
        let state = Arc::new(firefly_server::state::AppState::new(app, shutdown.clone()));
        let router = firefly_server::api::create_router(state);

        Self {
            router,
            fetcher,
            observer,
            shutdown,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
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

        TestResponse {
            status,
            headers,
            text,
            body,
        }
    }
}

fn write_lines<'a>(
    dir: &TempDir,
    name: &str,
    lines: impl Iterator<Item = &'a str>,
) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("Failed to create source file");
    for line in lines {
        writeln!(file, "{line}").expect("Failed to write source file");
    }
    path
}
