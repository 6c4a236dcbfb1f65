//! Stream listings and playback preparation.

use std::io::SeekFrom;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncSeekExt, Take};
use tracing::{debug, info, warn};

use super::range::{parse_range, ByteRange};
use crate::cache::SingleFlight;
use crate::config::StreamingConfig;
use crate::descriptor::{DescriptorResolver, ResolveError};
use crate::selection::{rank, FileClassifier, RankedStream, UserPreference};
use crate::source::{MediaQuery, SourceError, SourceManager};
use crate::store::{FileReader, ManagedTorrent, StoreError, TorrentStore};
use crate::units::format_bytes;

/// Errors from preparing or serving playback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Range not satisfiable for a file of {file_size} bytes")]
    RangeNotSatisfiable { file_size: u64 },
}

/// One playable entry of a stream listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamEntry {
    pub url: String,
    pub title: String,
    pub binge_group_key: String,
}

/// A file of a managed torrent, ready to be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayableFile {
    pub info_hash: String,
    pub file_index: usize,
    pub path: String,
    pub length: u64,
}

/// Ties the sources, the ranking and the store together for the HTTP layer.
pub struct StreamService {
    sources: Arc<SourceManager>,
    store: TorrentStore,
    resolver: Arc<DescriptorResolver>,
    classifier: Arc<dyn FileClassifier>,
    public_url: String,
    max_chunk_size: Option<u64>,
    playback: SingleFlight<ManagedTorrent, StreamError>,
}

impl StreamService {
    pub fn new(
        sources: Arc<SourceManager>,
        store: TorrentStore,
        resolver: Arc<DescriptorResolver>,
        classifier: Arc<dyn FileClassifier>,
        config: &StreamingConfig,
        public_url: &str,
    ) -> Self {
        Self {
            sources,
            store,
            resolver,
            classifier,
            public_url: public_url.trim_end_matches('/').to_string(),
            max_chunk_size: config.max_chunk_size,
            playback: SingleFlight::new(Duration::from_secs(config.playback_grace_secs)),
        }
    }

    pub fn sources(&self) -> &SourceManager {
        &self.sources
    }

    pub fn store(&self) -> &TorrentStore {
        &self.store
    }

    /// Ranked stream entries for a media query.
    pub async fn streams_for(
        &self,
        query: &MediaQuery,
        requester: &str,
        preference: &UserPreference,
    ) -> Vec<StreamEntry> {
        let candidates = self.sources.candidates_for(query).await;
        let found = candidates.len();

        let ranked = rank(
            candidates,
            preference,
            query.season,
            query.episode,
            self.classifier.as_ref(),
        );

        info!(
            media_id = %query.media_id,
            requester = %requester,
            found,
            playable = ranked.len(),
            "Streams listed"
        );

        ranked
            .iter()
            .map(|stream| self.stream_entry(requester, stream))
            .collect()
    }

    fn stream_entry(&self, requester: &str, stream: &RankedStream) -> StreamEntry {
        let candidate = &stream.candidate;
        let url = format!(
            "{}/api/v1/{}/play/{}/{}/{}/{}",
            self.public_url,
            urlencoding::encode(requester),
            urlencoding::encode(&candidate.source_name),
            urlencoding::encode(&candidate.source_id),
            urlencoding::encode(&candidate.info_hash),
            stream.file_index
        );

        let size = candidate
            .files
            .get(stream.file_index)
            .map(|f| format_bytes(f.length))
            .unwrap_or_default();

        let mut title = String::new();
        if stream.recommended {
            title.push_str("⭐️ Recommended\n");
        }
        title.push_str(&format!(
            "{} | {} | {}\n",
            candidate.language.flag(),
            candidate.display_resolution(stream.resolution),
            size
        ));
        title.push_str(&candidate.release_name);

        StreamEntry {
            url,
            title,
            binge_group_key: candidate.info_hash.clone(),
        }
    }

    /// The managed torrent for `info_hash`, fetching and registering its
    /// descriptor through the named source when the store lacks it.
    ///
    /// Concurrent requests for the same source item share one preparation.
    pub async fn ensure_torrent(
        &self,
        source_name: &str,
        source_id: &str,
        info_hash: &str,
    ) -> Result<ManagedTorrent, StreamError> {
        if let Some(torrent) = self.store.get_torrent(info_hash).await {
            return Ok(torrent);
        }

        let key = format!("{}:{}", source_name, source_id);
        let sources = Arc::clone(&self.sources);
        let resolver = Arc::clone(&self.resolver);
        let store = self.store.clone();
        let source_name = source_name.to_string();
        let source_id = source_id.to_string();
        let requested_hash = info_hash.to_string();

        self.playback
            .run(&key, move || async move {
                let url = sources
                    .download_url(&source_name, &source_id)
                    .await?
                    .ok_or_else(|| {
                        StreamError::NotFound(format!(
                            "No torrent {} on source {}",
                            source_id, source_name
                        ))
                    })?;

                let path = resolver.download_to_disk(&url).await?;
                let torrent = store.add_torrent(&path).await?;

                if torrent.info_hash != requested_hash {
                    warn!(
                        requested = %requested_hash,
                        actual = %torrent.info_hash,
                        source_id = %source_id,
                        "Source item resolved to a different info hash"
                    );
                }

                debug!(hash = %torrent.info_hash, source_id = %source_id, "Torrent ready for playback");
                Ok(torrent)
            })
            .await
    }

    /// Resolve the requested file of a torrent, preparing the torrent if needed.
    pub async fn playable_file(
        &self,
        source_name: &str,
        source_id: &str,
        info_hash: &str,
        file_index: usize,
    ) -> Result<PlayableFile, StreamError> {
        let torrent = self.ensure_torrent(source_name, source_id, info_hash).await?;

        let file = torrent.files.get(file_index).ok_or_else(|| {
            StreamError::NotFound(format!(
                "{} has no file {}",
                torrent.info_hash, file_index
            ))
        })?;

        Ok(PlayableFile {
            info_hash: torrent.info_hash.clone(),
            file_index,
            path: file.path.clone(),
            length: file.length,
        })
    }

    /// The span of `file` a `Range` header asks for.
    pub fn range_for(
        &self,
        file: &PlayableFile,
        header: Option<&str>,
    ) -> Result<ByteRange, StreamError> {
        parse_range(header, file.length, self.max_chunk_size).ok_or(
            StreamError::RangeNotSatisfiable {
                file_size: file.length,
            },
        )
    }

    /// A reader positioned at the start of `range` that ends after it.
    pub async fn open_range(
        &self,
        file: &PlayableFile,
        range: ByteRange,
    ) -> Result<Take<FileReader>, StreamError> {
        let mut reader = self.store.open_file(&file.info_hash, file.file_index).await?;

        reader
            .seek(SeekFrom::Start(range.start))
            .await
            .map_err(|e| StoreError::Io(format!("Failed to seek to {}: {}", range.start, e)))?;

        debug!(
            hash = %file.info_hash,
            file_index = file.file_index,
            start = range.start,
            end = range.end,
            "Serving range"
        );

        Ok(reader.take(range.content_length()))
    }
}
