//! Cinemeta client.
//!
//! Cinemeta serves public metadata keyed by IMDb id at
//! `{base}/meta/{type}/{id}.json`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{MetadataError, MetadataLookup};
use crate::config::MetadataConfig;
use crate::source::MediaType;

#[derive(Debug, Deserialize)]
struct MetaResponse {
    meta: Option<Meta>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    name: Option<String>,
}

pub struct CinemetaClient {
    client: Client,
    base_url: String,
}

impl CinemetaClient {
    pub fn new(config: &MetadataConfig) -> Result<Self, MetadataError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MetadataError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.cinemeta_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MetadataLookup for CinemetaClient {
    async fn title_for(&self, media_type: MediaType, media_id: &str) -> Result<String, MetadataError> {
        let url = format!("{}/meta/{}/{}.json", self.base_url, media_type, media_id);
        debug!(url = %url, "Cinemeta lookup");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                MetadataError::Timeout(url.clone())
            } else {
                MetadataError::HttpError(e.to_string())
            }
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(MetadataError::NotFound(media_id.to_string())),
            status if !status.is_success() => {
                return Err(MetadataError::HttpError(format!("{} returned HTTP {}", url, status)))
            }
            _ => {}
        }

        let body: MetaResponse = response
            .json()
            .await
            .map_err(|e| MetadataError::ParseError(e.to_string()))?;

        body.meta
            .and_then(|m| m.name)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| MetadataError::NotFound(media_id.to_string()))
    }
}
