//! Title lookup for the speculative search fallback.

mod cinemeta;

pub use cinemeta::CinemetaClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::source::MediaType;

/// Errors from a metadata service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Resolves a media identifier to a human-readable title.
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    async fn title_for(&self, media_type: MediaType, media_id: &str) -> Result<String, MetadataError>;
}
