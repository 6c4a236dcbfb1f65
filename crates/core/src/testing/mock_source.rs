//! Mock torrent source for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::source::{MediaQuery, SourceError, TorrentCandidate, TorrentSource};

/// Mock implementation of the TorrentSource trait.
///
/// Returned candidates carry this source's id as their `source_name`.
#[derive(Debug)]
pub struct MockTorrentSource {
    id: String,
    direct_results: Arc<RwLock<Vec<TorrentCandidate>>>,
    title_results: Arc<RwLock<Vec<TorrentCandidate>>>,
    download_urls: Arc<RwLock<HashMap<String, String>>>,
    removable: Arc<RwLock<Vec<String>>>,
    config_issue: Arc<RwLock<Option<String>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<SourceError>>>,
    direct_queries: Arc<RwLock<Vec<MediaQuery>>>,
    title_queries: Arc<RwLock<Vec<String>>>,
}

impl MockTorrentSource {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            direct_results: Arc::new(RwLock::new(Vec::new())),
            title_results: Arc::new(RwLock::new(Vec::new())),
            download_urls: Arc::new(RwLock::new(HashMap::new())),
            removable: Arc::new(RwLock::new(Vec::new())),
            config_issue: Arc::new(RwLock::new(None)),
            next_error: Arc::new(RwLock::new(None)),
            direct_queries: Arc::new(RwLock::new(Vec::new())),
            title_queries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Results for lookups by external id.
    pub async fn set_direct_results(&self, results: Vec<TorrentCandidate>) {
        *self.direct_results.write().await = results;
    }

    /// Results for title searches.
    pub async fn set_title_results(&self, results: Vec<TorrentCandidate>) {
        *self.title_results.write().await = results;
    }

    pub async fn set_download_url(&self, source_id: &str, url: &str) {
        self.download_urls
            .write()
            .await
            .insert(source_id.to_string(), url.to_string());
    }

    pub async fn set_removable(&self, info_hashes: Vec<String>) {
        *self.removable.write().await = info_hashes;
    }

    pub async fn set_config_issue(&self, issue: Option<String>) {
        *self.config_issue.write().await = issue;
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: SourceError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn direct_query_count(&self) -> usize {
        self.direct_queries.read().await.len()
    }

    /// Titles searched for, in call order.
    pub async fn title_queries(&self) -> Vec<String> {
        self.title_queries.read().await.clone()
    }

    async fn take_error(&self) -> Option<SourceError> {
        self.next_error.write().await.take()
    }

    fn stamp(&self, results: Vec<TorrentCandidate>) -> Vec<TorrentCandidate> {
        results
            .into_iter()
            .map(|mut c| {
                c.source_name = self.id.clone();
                c
            })
            .collect()
    }
}

#[async_trait]
impl TorrentSource for MockTorrentSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.id
    }

    async fn find_by_external_id(
        &self,
        query: &MediaQuery,
    ) -> Result<Vec<TorrentCandidate>, SourceError> {
        self.direct_queries.write().await.push(query.clone());
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        Ok(self.stamp(self.direct_results.read().await.clone()))
    }

    async fn find_by_title(
        &self,
        title: &str,
        _query: &MediaQuery,
    ) -> Result<Vec<TorrentCandidate>, SourceError> {
        self.title_queries.write().await.push(title.to_string());
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        Ok(self.stamp(self.title_results.read().await.clone()))
    }

    async fn download_url(&self, source_id: &str) -> Result<Option<String>, SourceError> {
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        Ok(self.download_urls.read().await.get(source_id).cloned())
    }

    async fn removable_info_hashes(&self) -> Result<Vec<String>, SourceError> {
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        Ok(self.removable.read().await.clone())
    }

    async fn config_issue(&self) -> Option<String> {
        self.config_issue.read().await.clone()
    }
}
