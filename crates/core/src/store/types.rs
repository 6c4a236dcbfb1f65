use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncSeek};

use crate::descriptor::ResolveError;

/// Errors from the torrent store and its engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Torrent not found: {0}")]
    NotFound(String),

    #[error("Download engine error: {0}")]
    Engine(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Descriptor(#[from] ResolveError),
}

/// A file of a managed torrent with its download state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagedFile {
    pub path: String,
    pub length: u64,
    pub downloaded: u64,
}

/// A torrent registered with the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagedTorrent {
    pub info_hash: String,
    pub name: String,
    /// The saved `.torrent` descriptor.
    pub file_path: PathBuf,
    /// Where the engine writes this torrent's content.
    pub download_path: PathBuf,
    pub files: Vec<ManagedFile>,
    /// Fraction downloaded, 0.0 to 1.0.
    pub progress: f64,
}

impl ManagedTorrent {
    pub fn total_length(&self) -> u64 {
        self.files.iter().map(|f| f.length).sum()
    }

    pub fn downloaded(&self) -> u64 {
        self.files.iter().map(|f| f.downloaded).sum()
    }
}

/// Human-readable summary of a managed torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TorrentStats {
    pub hash: String,
    pub name: String,
    /// Percentage with two decimals, e.g. `"42.17%"`.
    pub progress: String,
    pub size: String,
    pub downloaded: String,
}

/// Outcome of a cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub deleted: usize,
    pub failed: usize,
    /// Removable hashes that are not managed here.
    pub skipped: usize,
}

/// Download state reported by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineProgress {
    pub downloaded_bytes: u64,
    /// Bytes downloaded per file, in descriptor order.
    pub file_downloaded: Vec<u64>,
}

/// Seekable byte reader over one file of a torrent.
pub trait AsyncReadSeek: AsyncRead + AsyncSeek {}

impl<T: AsyncRead + AsyncSeek + ?Sized> AsyncReadSeek for T {}

/// Reads wait for missing pieces to arrive.
pub type FileReader = Pin<Box<dyn AsyncReadSeek + Send>>;

/// Embedded peer-to-peer download engine.
#[async_trait]
pub trait DownloadEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Register a descriptor without downloading any file yet.
    ///
    /// Resolves with the info hash once local state has been verified.
    /// Adding a torrent the engine already manages succeeds.
    async fn add(&self, descriptor: Vec<u8>) -> Result<String, StoreError>;

    /// Stop managing a torrent, leaving its files on disk.
    async fn remove(&self, info_hash: &str) -> Result<(), StoreError>;

    fn progress(&self, info_hash: &str) -> Option<EngineProgress>;

    /// Select a file for download and open a reader over it.
    async fn open_file(&self, info_hash: &str, file_index: usize) -> Result<FileReader, StoreError>;
}
