//! Multi-source fan-out with speculative fallback and query caching.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{settle_all, ConfigIssue, MediaQuery, SourceError, TorrentCandidate, TorrentSource};
use crate::cache::{cached, Memoized};
use crate::config::GatewayConfig;
use crate::metadata::MetadataLookup;
use crate::selection::{is_supported_media, select_file_index, FileClassifier};

type SourceQuery = (Arc<dyn TorrentSource>, MediaQuery);

/// Composes the configured torrent sources.
///
/// A failing source only shrinks the result set; aggregate calls never fail.
pub struct SourceManager {
    sources: Vec<Arc<dyn TorrentSource>>,
    search: Memoized<SourceQuery, Vec<TorrentCandidate>, SourceError>,
}

impl SourceManager {
    pub fn new(
        sources: Vec<Arc<dyn TorrentSource>>,
        metadata: Arc<dyn MetadataLookup>,
        classifier: Arc<dyn FileClassifier>,
        config: &GatewayConfig,
    ) -> Self {
        let search = cached(
            move |(source, query): SourceQuery| {
                let metadata = Arc::clone(&metadata);
                let classifier = Arc::clone(&classifier);
                async move {
                    search_source(source.as_ref(), &query, metadata.as_ref(), classifier.as_ref())
                        .await
                }
            },
            |(source, query): &SourceQuery| format!("{}|{}", source.id(), query.cache_key()),
            Duration::from_secs(config.query_cache_ttl_secs),
            config.query_cache_max_entries,
        );

        Self { sources, search }
    }

    pub fn sources(&self) -> &[Arc<dyn TorrentSource>] {
        &self.sources
    }

    /// Candidates from every source for the query.
    pub async fn candidates_for(&self, query: &MediaQuery) -> Vec<TorrentCandidate> {
        let operations = self.sources.iter().map(|source| {
            let search = self.search.clone();
            let input = (Arc::clone(source), query.clone());
            (source.id().to_string(), async move { search.call(input).await })
        });

        let candidates: Vec<TorrentCandidate> =
            settle_all(operations).await.into_iter().flatten().collect();

        info!(
            media_id = %query.media_id,
            season = ?query.season,
            episode = ?query.episode,
            candidates = candidates.len(),
            "Source query complete"
        );
        candidates
    }

    /// Download URL for a source handle, or `None` if the source is unknown
    /// or has no such item.
    pub async fn download_url(
        &self,
        source_name: &str,
        source_id: &str,
    ) -> Result<Option<String>, SourceError> {
        let Some(source) = self.sources.iter().find(|s| s.id() == source_name) else {
            warn!(source = %source_name, "Unknown torrent source");
            return Ok(None);
        };
        source.download_url(source_id).await
    }

    /// Union of removable info hashes across sources.
    pub async fn removable_info_hashes(&self) -> Vec<String> {
        let operations = self.sources.iter().map(|source| {
            let source = Arc::clone(source);
            (source.id().to_string(), async move { source.removable_info_hashes().await })
        });

        let mut seen = HashSet::new();
        settle_all(operations)
            .await
            .into_iter()
            .flatten()
            .filter(|hash| seen.insert(hash.to_lowercase()))
            .collect()
    }

    /// Health issues reported by sources. No sources at all is itself an issue.
    pub async fn config_issues(&self) -> Vec<ConfigIssue> {
        if self.sources.is_empty() {
            return vec![ConfigIssue {
                source_id: "none".to_string(),
                source_name: "No sources".to_string(),
                message: "No torrent sources are configured.".to_string(),
            }];
        }

        let probes = self.sources.iter().map(|source| async move {
            source.config_issue().await.map(|message| ConfigIssue {
                source_id: source.id().to_string(),
                source_name: source.display_name().to_string(),
                message,
            })
        });

        futures::future::join_all(probes)
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Direct id query, then the title fallback when that yields nothing,
/// followed by the episode filter.
async fn search_source(
    source: &dyn TorrentSource,
    query: &MediaQuery,
    metadata: &dyn MetadataLookup,
    classifier: &dyn FileClassifier,
) -> Result<Vec<TorrentCandidate>, SourceError> {
    let direct = source.find_by_external_id(query).await?;
    let direct = filter_playable(direct, query, classifier);
    if !direct.is_empty() {
        return Ok(direct);
    }

    let title = metadata
        .title_for(query.media_type, &query.media_id)
        .await
        .map_err(|e| SourceError::Metadata(e.to_string()))?;

    debug!(
        source = %source.id(),
        media_id = %query.media_id,
        title = %title,
        "No direct matches, searching by title"
    );

    let speculated = source
        .find_by_title(&title, query)
        .await?
        .into_iter()
        .map(|mut candidate| {
            candidate.is_speculated = true;
            candidate
        })
        .collect();

    Ok(filter_playable(speculated, query, classifier))
}

/// Drop candidates without a playable media file for the requested episode.
fn filter_playable(
    candidates: Vec<TorrentCandidate>,
    query: &MediaQuery,
    classifier: &dyn FileClassifier,
) -> Vec<TorrentCandidate> {
    let Some((season, episode)) = query.episode_ref() else {
        return candidates;
    };

    candidates
        .into_iter()
        .filter(|candidate| {
            select_file_index(candidate, Some(season), Some(episode), classifier)
                .and_then(|index| candidate.files.get(index))
                .is_some_and(|file| is_supported_media(&file.name))
        })
        .collect()
}
