use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::descriptor::{ResolveError, TorrentFile};
use crate::selection::{Language, Resolution};

/// Kind of media being looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Series,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "series",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaType::Movie),
            "series" => Ok(MediaType::Series),
            other => Err(format!("unknown media type: {}", other)),
        }
    }
}

/// A lookup for one movie or one episode of a show.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaQuery {
    /// External identifier, e.g. an IMDb id (`tt0111161`).
    pub media_id: String,
    pub media_type: MediaType,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl MediaQuery {
    pub fn movie(media_id: impl Into<String>) -> Self {
        Self {
            media_id: media_id.into(),
            media_type: MediaType::Movie,
            season: None,
            episode: None,
        }
    }

    pub fn episode(media_id: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            media_id: media_id.into(),
            media_type: MediaType::Series,
            season: Some(season),
            episode: Some(episode),
        }
    }

    /// Season and episode, when both are present.
    pub fn episode_ref(&self) -> Option<(u32, u32)> {
        self.season.zip(self.episode)
    }

    /// Key covering every query parameter.
    pub fn cache_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.media_type,
            self.media_id,
            self.season.map(|s| s.to_string()).unwrap_or_default(),
            self.episode.map(|e| e.to_string()).unwrap_or_default()
        )
    }
}

/// One release found by a source, with its descriptor already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentCandidate {
    /// Id of the source that produced this candidate (e.g. "ncore").
    pub source_name: String,
    /// Source-specific handle used to re-fetch the download link.
    pub source_id: String,
    pub info_hash: String,
    pub release_name: String,
    pub language: Language,
    /// Category bucket shown to users, e.g. "HD" or "DVD9".
    pub quality_label: String,
    /// Resolution assumed when a file name carries none.
    pub fallback_resolution: Resolution,
    pub files: Vec<TorrentFile>,
    pub seeders: u64,
    /// Found through the title fallback rather than a direct id match.
    pub is_speculated: bool,
}

impl TorrentCandidate {
    pub fn display_resolution(&self, resolution: Resolution) -> String {
        format!("{} ({})", self.quality_label, resolution)
    }
}

/// A source reporting a configuration or health problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigIssue {
    pub source_id: String,
    pub source_name: String,
    pub message: String,
}

/// Errors from a torrent source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Request failed: {0}")]
    Fetch(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Unexpected response: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Metadata lookup failed: {0}")]
    Metadata(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl SourceError {
    pub(crate) fn from_reqwest(context: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SourceError::Timeout(context.to_string())
        } else {
            SourceError::Fetch(format!("{}: {}", context, e))
        }
    }
}

/// An external torrent index.
#[async_trait]
pub trait TorrentSource: Send + Sync {
    /// Stable identifier used in URLs and logs.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn display_name(&self) -> &str;

    /// Releases matching the query's external identifier.
    async fn find_by_external_id(
        &self,
        query: &MediaQuery,
    ) -> Result<Vec<TorrentCandidate>, SourceError>;

    /// Releases whose name matches `title`, restricted to the query's media type.
    async fn find_by_title(
        &self,
        title: &str,
        query: &MediaQuery,
    ) -> Result<Vec<TorrentCandidate>, SourceError>;

    /// Descriptor download URL for a source handle, `None` if the source has no such item.
    async fn download_url(&self, source_id: &str) -> Result<Option<String>, SourceError>;

    /// Info hashes whose seeding obligations are fulfilled.
    async fn removable_info_hashes(&self) -> Result<Vec<String>, SourceError>;

    /// Lightweight health probe; `Some(message)` when something is wrong.
    async fn config_issue(&self) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_round_trip() {
        assert_eq!("movie".parse::<MediaType>(), Ok(MediaType::Movie));
        assert_eq!("series".parse::<MediaType>(), Ok(MediaType::Series));
        assert!("tv".parse::<MediaType>().is_err());
        assert_eq!(MediaType::Series.to_string(), "series");
    }

    #[test]
    fn test_cache_key_covers_all_parameters() {
        let movie = MediaQuery::movie("tt1");
        let ep1 = MediaQuery::episode("tt1", 1, 1);
        let ep2 = MediaQuery::episode("tt1", 1, 2);

        assert_eq!(movie.cache_key(), "movie:tt1::");
        assert_eq!(ep1.cache_key(), "series:tt1:1:1");
        assert_ne!(ep1.cache_key(), ep2.cache_key());
    }

    #[test]
    fn test_episode_ref_requires_both() {
        let mut query = MediaQuery::episode("tt1", 2, 3);
        assert_eq!(query.episode_ref(), Some((2, 3)));
        query.episode = None;
        assert_eq!(query.episode_ref(), None);
    }

    #[test]
    fn test_config_issue_serializes_camel_case() {
        let issue = ConfigIssue {
            source_id: "ncore".to_string(),
            source_name: "nCore".to_string(),
            message: "bad".to_string(),
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["sourceId"], "ncore");
        assert_eq!(json["sourceName"], "nCore");
    }
}
