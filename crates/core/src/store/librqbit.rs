//! Download engine backed by an embedded librqbit session.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use librqbit::{
    AddTorrent, AddTorrentOptions, AddTorrentResponse, ManagedTorrent, Session, SessionOptions,
    SessionPersistenceConfig,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::types::{DownloadEngine, EngineProgress, FileReader, StoreError};
use crate::config::EngineConfig;

/// Session state lives next to the downloaded content.
const SESSION_DIR: &str = ".session";

/// Embedded librqbit engine.
///
/// Torrents are added paused. Opening a file narrows the torrent's selection
/// to the files opened so far and resumes it.
pub struct LibrqbitEngine {
    session: Arc<Session>,
    download_path: PathBuf,
    selected: Mutex<HashMap<String, HashSet<usize>>>,
}

impl LibrqbitEngine {
    pub async fn new(config: &EngineConfig, download_path: &Path) -> Result<Self, StoreError> {
        let download_path = download_path.to_path_buf();

        if !download_path.exists() {
            std::fs::create_dir_all(&download_path).map_err(|e| {
                StoreError::Io(format!("Failed to create download directory: {}", e))
            })?;
        }

        let mut opts = SessionOptions::default();
        if !config.enable_dht {
            opts.disable_dht = true;
        }
        if let Some(port) = config.listen_port {
            opts.listen_port_range = Some(port..(port + 1));
        }
        opts.persistence = Some(SessionPersistenceConfig::Json {
            folder: Some(download_path.join(SESSION_DIR)),
        });

        info!(
            download_path = %download_path.display(),
            dht_enabled = !opts.disable_dht,
            "Initializing librqbit session"
        );

        let session = Session::new_with_opts(download_path.clone(), opts)
            .await
            .map_err(|e| {
                StoreError::Engine(format!("Failed to initialize librqbit session: {}", e))
            })?;

        if let Some(port) = session.tcp_listen_port() {
            info!(port = port, "librqbit listening on TCP port");
        }

        Ok(Self {
            session,
            download_path,
            selected: Mutex::new(HashMap::new()),
        })
    }

    pub fn download_path(&self) -> &Path {
        &self.download_path
    }

    fn find_torrent(&self, hash: &str) -> Option<Arc<ManagedTorrent>> {
        let hash = hash.to_lowercase();

        self.session.with_torrents(|iter| {
            for (_, torrent) in iter {
                if torrent.info_hash().as_string() == hash {
                    return Some(torrent.clone());
                }
            }
            None
        })
    }
}

#[async_trait]
impl DownloadEngine for LibrqbitEngine {
    fn name(&self) -> &str {
        "librqbit"
    }

    async fn add(&self, descriptor: Vec<u8>) -> Result<String, StoreError> {
        let opts = AddTorrentOptions {
            paused: true,
            overwrite: true,
            ..Default::default()
        };

        let response = self
            .session
            .add_torrent(AddTorrent::from_bytes(descriptor), Some(opts))
            .await
            .map_err(|e| StoreError::Engine(format!("Failed to add torrent: {}", e)))?;

        let handle = match response {
            AddTorrentResponse::Added(_, handle) => handle,
            AddTorrentResponse::AlreadyManaged(_, handle) => {
                debug!(hash = %handle.info_hash().as_string(), "Torrent already managed");
                handle
            }
            AddTorrentResponse::ListOnly(_) => {
                return Err(StoreError::Engine(
                    "Torrent was added in list-only mode".to_string(),
                ));
            }
        };

        handle
            .wait_until_initialized()
            .await
            .map_err(|e| StoreError::Engine(format!("Failed to verify torrent: {}", e)))?;

        let hash = handle.info_hash().as_string();
        debug!(hash = %hash, name = ?handle.name(), "Torrent added");

        Ok(hash)
    }

    async fn remove(&self, info_hash: &str) -> Result<(), StoreError> {
        let torrent = self
            .find_torrent(info_hash)
            .ok_or_else(|| StoreError::NotFound(info_hash.to_string()))?;

        self.session
            .delete(torrent.id().into(), false)
            .await
            .map_err(|e| StoreError::Engine(format!("Failed to remove torrent: {}", e)))?;

        self.selected.lock().await.remove(&info_hash.to_lowercase());
        debug!(hash = %info_hash, "Torrent removed from engine");

        Ok(())
    }

    fn progress(&self, info_hash: &str) -> Option<EngineProgress> {
        let stats = self.find_torrent(info_hash)?.stats();

        Some(EngineProgress {
            downloaded_bytes: stats.progress_bytes,
            file_downloaded: stats.file_progress.clone(),
        })
    }

    async fn open_file(&self, info_hash: &str, file_index: usize) -> Result<FileReader, StoreError> {
        let torrent = self
            .find_torrent(info_hash)
            .ok_or_else(|| StoreError::NotFound(info_hash.to_string()))?;

        {
            let mut selected = self.selected.lock().await;
            let files = selected.entry(info_hash.to_lowercase()).or_default();
            if files.insert(file_index) {
                self.session
                    .update_only_files(&torrent, &*files)
                    .await
                    .map_err(|e| {
                        StoreError::Engine(format!("Failed to select file {}: {}", file_index, e))
                    })?;
                debug!(hash = %info_hash, file_index, "File selected for download");
            }
        }

        if torrent.is_paused() {
            self.session
                .unpause(&torrent)
                .await
                .map_err(|e| StoreError::Engine(format!("Failed to resume torrent: {}", e)))?;
        }

        let stream = torrent
            .clone()
            .stream(file_index)
            .map_err(|e| StoreError::Engine(format!("Failed to open file stream: {}", e)))?;

        Ok(Box::pin(stream))
    }
}
