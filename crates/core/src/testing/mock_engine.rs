//! Mock download engine for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::descriptor::parse_descriptor;
use crate::store::{DownloadEngine, EngineProgress, FileReader, StoreError};

#[derive(Debug, Clone)]
struct MockTorrent {
    lengths: Vec<u64>,
    downloaded: Vec<u64>,
    opened: Vec<usize>,
}

/// In-memory implementation of the DownloadEngine trait.
///
/// Every file's content is [`MockDownloadEngine::file_bytes`] of its length.
/// Setters are synchronous so tests can drive the engine between awaits.
#[derive(Debug, Default)]
pub struct MockDownloadEngine {
    torrents: Mutex<HashMap<String, MockTorrent>>,
    /// If set, the next operation will fail with this error.
    next_error: Mutex<Option<StoreError>>,
    add_delay: Mutex<Duration>,
    add_calls: AtomicUsize,
    remove_calls: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockDownloadEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic content of a file with `length` bytes.
    pub fn file_bytes(length: u64) -> Vec<u8> {
        (0..length).map(|i| (i % 251) as u8).collect()
    }

    /// Configure the next operation to fail with the given error.
    pub fn set_next_error(&self, error: StoreError) {
        *lock(&self.next_error) = Some(error);
    }

    /// Make `add` take this long, to widen race windows.
    pub fn set_add_delay(&self, delay: Duration) {
        *lock(&self.add_delay) = delay;
    }

    /// Report `bytes` downloaded for one file.
    pub fn set_downloaded(&self, info_hash: &str, file_index: usize, bytes: u64) {
        if let Some(torrent) = lock(&self.torrents).get_mut(info_hash) {
            if let Some(slot) = torrent.downloaded.get_mut(file_index) {
                *slot = bytes;
            }
        }
    }

    pub fn add_count(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    pub fn remove_count(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    pub fn has_torrent(&self, info_hash: &str) -> bool {
        lock(&self.torrents).contains_key(info_hash)
    }

    /// File indices opened for a torrent, in call order.
    pub fn opened_files(&self, info_hash: &str) -> Vec<usize> {
        lock(&self.torrents)
            .get(info_hash)
            .map(|t| t.opened.clone())
            .unwrap_or_default()
    }

    fn take_error(&self) -> Option<StoreError> {
        lock(&self.next_error).take()
    }
}

#[async_trait]
impl DownloadEngine for MockDownloadEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn add(&self, descriptor: Vec<u8>) -> Result<String, StoreError> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.take_error() {
            return Err(error);
        }

        let delay = *lock(&self.add_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let parsed = parse_descriptor(&descriptor)?;
        let lengths: Vec<u64> = parsed.files.iter().map(|f| f.length).collect();

        lock(&self.torrents)
            .entry(parsed.info_hash.clone())
            .or_insert_with(|| MockTorrent {
                downloaded: vec![0; lengths.len()],
                lengths,
                opened: Vec::new(),
            });

        Ok(parsed.info_hash)
    }

    async fn remove(&self, info_hash: &str) -> Result<(), StoreError> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.take_error() {
            return Err(error);
        }

        lock(&self.torrents)
            .remove(info_hash)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(info_hash.to_string()))
    }

    fn progress(&self, info_hash: &str) -> Option<EngineProgress> {
        let torrents = lock(&self.torrents);
        let torrent = torrents.get(info_hash)?;

        Some(EngineProgress {
            downloaded_bytes: torrent.downloaded.iter().sum(),
            file_downloaded: torrent.downloaded.clone(),
        })
    }

    async fn open_file(&self, info_hash: &str, file_index: usize) -> Result<FileReader, StoreError> {
        if let Some(error) = self.take_error() {
            return Err(error);
        }

        let mut torrents = lock(&self.torrents);
        let torrent = torrents
            .get_mut(info_hash)
            .ok_or_else(|| StoreError::NotFound(info_hash.to_string()))?;
        let length = *torrent.lengths.get(file_index).ok_or_else(|| {
            StoreError::NotFound(format!("{} has no file {}", info_hash, file_index))
        })?;
        torrent.opened.push(file_index);

        Ok(Box::pin(Cursor::new(Self::file_bytes(length))))
    }
}
