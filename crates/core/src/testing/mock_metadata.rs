//! Mock metadata lookup for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::metadata::{MetadataError, MetadataLookup};
use crate::source::MediaType;

/// Mock implementation of the MetadataLookup trait.
///
/// Unknown ids fail with `NotFound`.
#[derive(Debug, Default)]
pub struct MockMetadataLookup {
    titles: Arc<RwLock<HashMap<String, String>>>,
    lookups: Arc<RwLock<Vec<(MediaType, String)>>>,
}

impl MockMetadataLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_title(&self, media_id: &str, title: &str) {
        self.titles
            .write()
            .await
            .insert(media_id.to_string(), title.to_string());
    }

    pub async fn lookup_count(&self) -> usize {
        self.lookups.read().await.len()
    }
}

#[async_trait]
impl MetadataLookup for MockMetadataLookup {
    async fn title_for(&self, media_type: MediaType, media_id: &str) -> Result<String, MetadataError> {
        self.lookups
            .write()
            .await
            .push((media_type, media_id.to_string()));

        self.titles
            .read()
            .await
            .get(media_id)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(media_id.to_string()))
    }
}
