use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A file inside a torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentFile {
    /// File name without directories.
    pub name: String,
    /// Path relative to the download directory, including the torrent's root folder.
    pub path: String,
    pub length: u64,
    /// Byte offset of this file within the concatenated torrent content.
    pub offset: u64,
}

/// The parts of a descriptor the rest of the system needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDescriptor {
    /// Lowercase hex SHA-1 of the info dictionary.
    pub info_hash: String,
    pub name: String,
    /// Never empty.
    pub files: Vec<TorrentFile>,
}

impl ParsedDescriptor {
    pub fn total_length(&self) -> u64 {
        self.files.iter().map(|f| f.length).sum()
    }
}

/// Errors from fetching or parsing a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Failed to fetch torrent: {0}")]
    Fetch(String),

    #[error("Timed out fetching torrent: {0}")]
    Timeout(String),

    #[error("Failed to parse torrent: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl ResolveError {
    /// Network failures may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ResolveError::Fetch(_) | ResolveError::Timeout(_))
    }
}
