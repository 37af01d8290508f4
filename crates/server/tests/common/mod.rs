//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! with mock dependencies injected, so the bridge can be exercised without
//! network access or a real BitTorrent engine.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use cinebridge_core::subtitles::SubtitleProviderKind;
use cinebridge_core::testing::{MockCatalog, MockEngine, MockProvider, MockSubtitleProvider};
use cinebridge_core::{
    Config, MetadataCatalog, ProgressHub, ProviderKind, QuotaEnforcer, SessionManager,
    SourceAggregator, SubtitleAggregator, SubtitleProvider, TorrentEngine, TorrentProvider,
};
use cinebridge_server::{create_router, AppState};

/// Re-export fixtures for test convenience
pub use cinebridge_core::testing::fixtures;

/// Test fixture with fully controllable mocks for:
/// - Torrent providers (MockProvider for PirateBay and TorrentsCsv)
/// - The BitTorrent engine (MockEngine)
/// - Metadata and subtitle backends
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_search() {
///     let fixture = TestFixture::new();
///     fixture.piratebay.set_records(vec![fixtures::piratebay_record("Dune", 'a', 5)]).await;
///
///     let response = fixture.post("/api/v1/sources/search", json!({"query": "Dune"})).await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    pub router: Router,
    pub state: Arc<AppState>,
    pub engine: Arc<MockEngine>,
    pub piratebay: Arc<MockProvider>,
    pub torrents_csv: Arc<MockProvider>,
    pub catalog: Arc<MockCatalog>,
    pub subtitles: Arc<MockSubtitleProvider>,
    /// Download directory and settings file live here
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    pub fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let download_path = temp_dir.path().join("downloads");
        std::fs::create_dir_all(&download_path).expect("Failed to create download dir");

        let mut config = Config::default();
        config.server.port = 0;
        config.engine.download_path = download_path.clone();
        config.cache.limit_bytes = test_config.cache_limit_bytes;
        config.stream.start_timeout_secs = test_config.start_timeout_secs;
        config.settings.path = Some(settings_path(&temp_dir));
        config.subtitles.languages = vec!["en".to_string()];

        let engine = Arc::new(MockEngine::new());
        let piratebay = Arc::new(MockProvider::new(ProviderKind::PirateBay));
        let torrents_csv = Arc::new(MockProvider::new(ProviderKind::TorrentsCsv));
        let catalog = Arc::new(MockCatalog::new());
        let subtitles = Arc::new(MockSubtitleProvider::new(SubtitleProviderKind::Stremio));

        let aggregator = SourceAggregator::new(vec![
            Arc::clone(&piratebay) as Arc<dyn TorrentProvider>,
            Arc::clone(&torrents_csv) as Arc<dyn TorrentProvider>,
        ]);
        let sessions = Arc::new(SessionManager::new(
            Arc::clone(&engine) as Arc<dyn TorrentEngine>,
            ProgressHub::default(),
            &config.stream,
        ));
        let quota = Arc::new(QuotaEnforcer::new(download_path, config.cache.limit_bytes));

        let state = Arc::new(AppState::new(
            config,
            aggregator,
            sessions,
            quota,
            SubtitleAggregator::new(vec![Arc::clone(&subtitles) as Arc<dyn SubtitleProvider>]),
            Arc::clone(&catalog) as Arc<dyn MetadataCatalog>,
        ));
        let router = create_router(Arc::clone(&state));

        Self {
            router,
            state,
            engine,
            piratebay,
            torrents_csv,
            catalog,
            subtitles,
            temp_dir,
        }
    }

    pub fn download_path(&self) -> PathBuf {
        self.temp_dir.path().join("downloads")
    }

    pub fn settings_path(&self) -> PathBuf {
        settings_path(&self.temp_dir)
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

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
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

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into_owned()))
        };

        TestResponse { status, body }
    }
}

fn settings_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("settings.json")
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub start_timeout_secs: u64,
    pub cache_limit_bytes: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            start_timeout_secs: 10,
            cache_limit_bytes: 1024 * 1024 * 1024,
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
