//! Registry of managed torrents on top of a download engine.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::types::{
    CleanupReport, DownloadEngine, FileReader, ManagedFile, ManagedTorrent, StoreError,
    TorrentStats,
};
use crate::cache::SingleFlight;
use crate::descriptor::{parse_descriptor, ParsedDescriptor, TorrentFile};
use crate::source::SourceManager;
use crate::units::format_bytes;

#[derive(Debug, Clone)]
struct Registration {
    name: String,
    file_path: PathBuf,
    files: Vec<TorrentFile>,
}

/// Owns the download engine and the set of torrents registered with it.
///
/// Holds at most one entry per info hash. Cloning shares the same registry.
#[derive(Clone)]
pub struct TorrentStore {
    engine: Arc<dyn DownloadEngine>,
    registry: Arc<RwLock<HashMap<String, Registration>>>,
    adding: SingleFlight<String, StoreError>,
    torrents_dir: PathBuf,
    downloads_dir: PathBuf,
}

impl TorrentStore {
    pub fn new(
        engine: Arc<dyn DownloadEngine>,
        torrents_dir: impl Into<PathBuf>,
        downloads_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            engine,
            registry: Arc::new(RwLock::new(HashMap::new())),
            adding: SingleFlight::new(Duration::ZERO),
            torrents_dir: torrents_dir.into(),
            downloads_dir: downloads_dir.into(),
        }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn torrents_dir(&self) -> &Path {
        &self.torrents_dir
    }

    /// Register a saved descriptor with the engine.
    ///
    /// Concurrent calls for the same content share one registration, even
    /// from different paths. Adding a descriptor whose info hash is already
    /// managed returns the existing entry.
    pub async fn add_torrent(&self, descriptor_path: &Path) -> Result<ManagedTorrent, StoreError> {
        let bytes = tokio::fs::read(descriptor_path).await.map_err(|e| {
            StoreError::Io(format!("Failed to read {}: {}", descriptor_path.display(), e))
        })?;
        let descriptor = parse_descriptor(&bytes)?;
        let key = descriptor.info_hash.clone();

        let store = self.clone();
        let path = descriptor_path.to_path_buf();
        let hash = self
            .adding
            .run(&key, move || async move { store.register(path, bytes, descriptor).await })
            .await?;

        self.get_torrent(&hash)
            .await
            .ok_or(StoreError::NotFound(hash))
    }

    async fn register(
        &self,
        path: PathBuf,
        bytes: Vec<u8>,
        descriptor: ParsedDescriptor,
    ) -> Result<String, StoreError> {
        if self.registry.read().await.contains_key(&descriptor.info_hash) {
            debug!(hash = %descriptor.info_hash, "Torrent already registered");
            return Ok(descriptor.info_hash);
        }

        let hash = normalize_hash(&self.engine.add(bytes).await?);

        let mut registry = self.registry.write().await;
        registry.entry(hash.clone()).or_insert_with(|| Registration {
            name: descriptor.name.clone(),
            file_path: path.clone(),
            files: descriptor.files,
        });

        info!(
            hash = %hash,
            name = %descriptor.name,
            engine = self.engine.name(),
            "Torrent registered"
        );

        Ok(hash)
    }

    /// Look up a managed torrent. Never touches the network.
    pub async fn get_torrent(&self, info_hash: &str) -> Option<ManagedTorrent> {
        let info_hash = normalize_hash(info_hash);
        let registration = self.registry.read().await.get(&info_hash).cloned()?;
        Some(self.to_managed(&info_hash, registration))
    }

    pub async fn contains(&self, info_hash: &str) -> bool {
        self.registry.read().await.contains_key(&normalize_hash(info_hash))
    }

    /// Open a reader over one file of a managed torrent.
    pub async fn open_file(
        &self,
        info_hash: &str,
        file_index: usize,
    ) -> Result<FileReader, StoreError> {
        let info_hash = normalize_hash(info_hash);
        let file_count = self
            .registry
            .read()
            .await
            .get(&info_hash)
            .map(|r| r.files.len())
            .ok_or_else(|| StoreError::NotFound(info_hash.to_string()))?;

        if file_index >= file_count {
            return Err(StoreError::NotFound(format!(
                "{} has no file {}",
                info_hash, file_index
            )));
        }

        self.engine.open_file(&info_hash, file_index).await
    }

    /// Remove a torrent, its downloaded content and its descriptor.
    ///
    /// Returns `Ok(false)` when the hash is not managed. An engine that no
    /// longer knows the torrent counts as removed.
    pub async fn delete_torrent(&self, info_hash: &str) -> Result<bool, StoreError> {
        let info_hash = normalize_hash(info_hash);
        let info_hash = info_hash.as_str();
        let Some(registration) = self.registry.write().await.remove(info_hash) else {
            debug!(hash = %info_hash, "Delete requested for unmanaged torrent");
            return Ok(false);
        };

        match self.engine.remove(info_hash).await {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => {
                debug!(hash = %info_hash, "Torrent already gone from engine");
            }
            Err(e) => {
                self.registry
                    .write()
                    .await
                    .entry(info_hash.to_string())
                    .or_insert(registration);
                return Err(e);
            }
        }

        if let Some(content) = self.content_path(&registration.name, info_hash) {
            remove_path(&content).await?;
            debug!(hash = %info_hash, path = %content.display(), "Removed downloaded content");
        }

        match tokio::fs::remove_file(&registration.file_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(StoreError::Io(format!(
                    "Failed to remove {}: {}",
                    registration.file_path.display(),
                    e
                )));
            }
        }

        info!(hash = %info_hash, name = %registration.name, "Torrent deleted");
        Ok(true)
    }

    /// Formatted summary of every managed torrent, sorted by name.
    pub async fn get_store_stats(&self) -> Vec<TorrentStats> {
        let registry = self.registry.read().await.clone();

        let mut stats: Vec<TorrentStats> = registry
            .into_iter()
            .filter(|(hash, _)| !hash.is_empty())
            .map(|(hash, registration)| {
                let torrent = self.to_managed(&hash, registration);
                let size = torrent.total_length();
                let downloaded = torrent.downloaded();
                TorrentStats {
                    hash,
                    name: torrent.name,
                    progress: format_progress(downloaded, size),
                    size: format_bytes(size),
                    downloaded: format_bytes(downloaded),
                }
            })
            .collect();

        stats.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.hash.cmp(&b.hash)));
        stats
    }

    /// Register every `*.torrent` file in the torrents directory.
    ///
    /// Returns how many were registered. Failures are logged and skipped.
    pub async fn load_existing_torrents(&self) -> Result<usize, StoreError> {
        if !self.torrents_dir.exists() {
            tokio::fs::create_dir_all(&self.torrents_dir)
                .await
                .map_err(|e| StoreError::Io(format!("Failed to create torrents directory: {}", e)))?;
            return Ok(0);
        }

        let mut entries = tokio::fs::read_dir(&self.torrents_dir)
            .await
            .map_err(|e| StoreError::Io(format!("Failed to read torrents directory: {}", e)))?;

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::Io(format!("Failed to read torrents directory: {}", e)))?
        {
            let path = entry.path();
            let is_descriptor = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("torrent"))
                .unwrap_or(false);
            if is_descriptor && path.is_file() {
                paths.push(path);
            }
        }

        let results = join_all(paths.iter().map(|path| self.add_torrent(path))).await;

        let mut loaded = 0;
        for (path, result) in paths.iter().zip(results) {
            match result {
                Ok(_) => loaded += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to load torrent"),
            }
        }

        info!(loaded, found = paths.len(), "Loaded existing torrents");
        Ok(loaded)
    }

    /// Delete every managed torrent the sources report as removable.
    pub async fn delete_unnecessary_torrents(&self, sources: &SourceManager) -> CleanupReport {
        let removable = sources.removable_info_hashes().await;
        let mut report = CleanupReport::default();

        for hash in removable {
            if !self.contains(&hash).await {
                report.skipped += 1;
                continue;
            }

            match self.delete_torrent(&hash).await {
                Ok(true) => report.deleted += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    warn!(hash = %hash, error = %e, "Failed to delete removable torrent");
                    report.failed += 1;
                }
            }
        }

        info!(
            deleted = report.deleted,
            failed = report.failed,
            skipped = report.skipped,
            "Cleanup finished"
        );
        report
    }

    fn to_managed(&self, info_hash: &str, registration: Registration) -> ManagedTorrent {
        let progress = self.engine.progress(info_hash).unwrap_or_default();

        let files: Vec<ManagedFile> = registration
            .files
            .iter()
            .enumerate()
            .map(|(i, f)| ManagedFile {
                path: f.path.clone(),
                length: f.length,
                downloaded: progress
                    .file_downloaded
                    .get(i)
                    .copied()
                    .unwrap_or(0)
                    .min(f.length),
            })
            .collect();

        let total: u64 = files.iter().map(|f| f.length).sum();
        let downloaded: u64 = files.iter().map(|f| f.downloaded).sum();

        ManagedTorrent {
            info_hash: info_hash.to_string(),
            download_path: self.downloads_dir.join(&registration.name),
            name: registration.name,
            file_path: registration.file_path,
            files,
            progress: if total > 0 {
                downloaded as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    /// First existing content location for a torrent, if any.
    fn content_path(&self, name: &str, info_hash: &str) -> Option<PathBuf> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            warn!(hash = %info_hash, name = %name, "Refusing to resolve content path");
            return None;
        }

        let short_hash = info_hash.get(..8).unwrap_or(info_hash);
        [
            self.downloads_dir.join(format!("{} - {}", name, short_hash)),
            self.downloads_dir.join(name),
        ]
        .into_iter()
        .find(|path| path.exists())
    }
}

async fn remove_path(path: &Path) -> Result<(), StoreError> {
    let result = if path.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::Io(format!(
            "Failed to remove {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Registry keys are lowercase hex.
fn normalize_hash(info_hash: &str) -> String {
    info_hash.to_ascii_lowercase()
}

fn format_progress(downloaded: u64, total: u64) -> String {
    let percent = if total > 0 {
        downloaded as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    format!("{:.2}%", percent)
}
