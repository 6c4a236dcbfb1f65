//! Common test utilities for end-to-end testing with mocks.
//!
//! The fixture builds the real router and stream service on top of the
//! mock download engine, a mock torrent source and a mock metadata lookup.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use torrentcast_core::config::{GatewayConfig, ResolverConfig, StreamingConfig};
use torrentcast_core::testing::{MockDownloadEngine, MockMetadataLookup, MockTorrentSource};
use torrentcast_core::{
    Config, DescriptorResolver, DownloadEngine, FileClassifier, Language, ManagedTorrent,
    MetadataLookup, ReleaseNameClassifier, Resolution, SourceManager, StaticPreferences,
    StreamService, TorrentSource, TorrentStore, UserPreference,
};
use torrentcast_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use torrentcast_core::testing::fixtures;

/// Requester with Hungarian 1080P preferences.
pub const REQUESTER: &str = "tv";

pub const PUBLIC_URL: &str = "http://stream.test";

/// Test fixture for end-to-end testing with mock dependencies.
pub struct TestFixture {
    pub router: Router,
    /// Mock source registered as "ncore"
    pub source: Arc<MockTorrentSource>,
    pub metadata: Arc<MockMetadataLookup>,
    pub engine: Arc<MockDownloadEngine>,
    pub store: TorrentStore,
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestFixture {
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let torrents_dir = temp_dir.path().join("torrents");
        let downloads_dir = temp_dir.path().join("downloads");

        let source = Arc::new(MockTorrentSource::new("ncore"));
        let metadata = Arc::new(MockMetadataLookup::new());
        let engine = Arc::new(MockDownloadEngine::new());

        let mut preferences = HashMap::new();
        preferences.insert(
            REQUESTER.to_string(),
            UserPreference {
                language: Language::Hu,
                resolutions: vec![Resolution::R1080P],
            },
        );

        let mut config = Config::default();
        config.server.public_url = PUBLIC_URL.to_string();
        config.storage.torrents_dir = torrents_dir.clone();
        config.storage.downloads_dir = downloads_dir.clone();
        config.streaming = StreamingConfig {
            max_chunk_size: test_config.max_chunk_size,
            ..StreamingConfig::default()
        };
        config.preferences = preferences.clone();

        let resolver = Arc::new(
            DescriptorResolver::new(&ResolverConfig::default(), torrents_dir.clone())
                .expect("Failed to create resolver"),
        );
        let classifier: Arc<dyn FileClassifier> = Arc::new(ReleaseNameClassifier::new());
        let sources = Arc::new(SourceManager::new(
            vec![Arc::clone(&source) as Arc<dyn TorrentSource>],
            Arc::clone(&metadata) as Arc<dyn MetadataLookup>,
            Arc::clone(&classifier),
            &GatewayConfig::default(),
        ));
        let store = TorrentStore::new(
            Arc::clone(&engine) as Arc<dyn DownloadEngine>,
            torrents_dir,
            downloads_dir,
        );

        let streams = Arc::new(StreamService::new(
            sources,
            store.clone(),
            resolver,
            classifier,
            &config.streaming,
            &config.server.public_url,
        ));

        let state = Arc::new(AppState::new(
            config,
            streams,
            Arc::new(StaticPreferences::new(preferences)),
        ));

        Self {
            router: create_router(state),
            source,
            metadata,
            engine,
            store,
            temp_dir,
        }
    }

    /// Write a descriptor to disk and register it with the store.
    pub async fn add_torrent(&self, name: &str, files: &[(&str, u64)]) -> ManagedTorrent {
        let dir = self.temp_dir.path().join("torrents");
        std::fs::create_dir_all(&dir).expect("Failed to create torrents dir");

        let path: PathBuf = dir.join(format!("{}.torrent", name));
        std::fs::write(&path, fixtures::multi_file_descriptor(name, files))
            .expect("Failed to write descriptor");

        self.store
            .add_torrent(&path)
            .await
            .expect("Failed to add torrent")
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, &[]).await
    }

    pub async fn get_with_headers(&self, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        self.request("GET", path, headers).await
    }

    pub async fn head(&self, path: &str) -> TestResponse {
        self.request("HEAD", path, &[]).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, &[]).await
    }

    async fn request(&self, method: &str, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::empty()).unwrap();

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

        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            bytes,
            body,
        }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Cap on the bytes served per range request
    pub max_chunk_size: Option<u64>,
}

impl TestConfig {
    pub fn with_max_chunk_size(max_chunk_size: u64) -> Self {
        Self {
            max_chunk_size: Some(max_chunk_size),
        }
    }
}

/// Path of the play endpoint for a file of a managed torrent.
pub fn play_path(source_id: &str, info_hash: &str, file_index: usize) -> String {
    format!(
        "/api/v1/{}/play/ncore/{}/{}/{}",
        REQUESTER, source_id, info_hash, file_index
    )
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
