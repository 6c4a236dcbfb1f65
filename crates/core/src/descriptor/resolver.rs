//! HTTP-backed descriptor resolution with caching and in-flight dedup.

use reqwest::header::CONTENT_DISPOSITION;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{parse_descriptor, ParsedDescriptor, ResolveError};
use crate::cache::{cached, Memoized, SingleFlight};
use crate::config::ResolverConfig;

/// Fetches `.torrent` files and turns them into [`ParsedDescriptor`]s.
///
/// `resolve` results are cached by URL, and concurrent resolutions of the
/// same URL share one fetch. `download_to_disk` collapses concurrent
/// downloads of the same URL for a short grace window.
pub struct DescriptorResolver {
    client: Client,
    torrents_dir: PathBuf,
    resolved: Memoized<String, ParsedDescriptor, ResolveError>,
    downloads: SingleFlight<PathBuf, ResolveError>,
}

impl DescriptorResolver {
    pub fn new(config: &ResolverConfig, torrents_dir: PathBuf) -> Result<Self, ResolveError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ResolveError::Fetch(format!("failed to build HTTP client: {}", e)))?;

        let grace = Duration::from_secs(config.inflight_grace_secs);
        let fetches: SingleFlight<ParsedDescriptor, ResolveError> = SingleFlight::new(grace);
        let fetch_client = client.clone();

        let resolved = cached(
            move |url: String| {
                let client = fetch_client.clone();
                let fetches = fetches.clone();
                async move {
                    let key = url.clone();
                    fetches
                        .run(&key, move || async move {
                            let (bytes, _) = fetch_descriptor(&client, &url).await?;
                            parse_descriptor(&bytes).inspect_err(|e| {
                                warn!(url = %url, error = %e, "Malformed torrent descriptor");
                            })
                        })
                        .await
                }
            },
            |url: &String| url.clone(),
            Duration::from_secs(config.cache_ttl_secs),
            config.cache_max_entries,
        );

        Ok(Self {
            client,
            torrents_dir,
            resolved,
            downloads: SingleFlight::new(grace),
        })
    }

    /// Fetch and parse the descriptor at `url`.
    pub async fn resolve(&self, url: &str) -> Result<ParsedDescriptor, ResolveError> {
        self.resolved.call(url.to_string()).await
    }

    /// Fetch the descriptor at `url` and store it as
    /// `{torrents_dir}/{name}-{info_hash}.torrent`.
    ///
    /// `name` comes from the response's content-disposition filename, falling
    /// back to the torrent's own name.
    pub async fn download_to_disk(&self, url: &str) -> Result<PathBuf, ResolveError> {
        let client = self.client.clone();
        let torrents_dir = self.torrents_dir.clone();
        let owned_url = url.to_string();

        self.downloads
            .run(url, move || async move {
                let (bytes, disposition) = fetch_descriptor(&client, &owned_url).await?;
                let parsed = parse_descriptor(&bytes)?;

                let base_name = disposition
                    .as_deref()
                    .and_then(filename_from_disposition)
                    .map(|f| strip_torrent_extension(&f).to_string())
                    .filter(|f| !f.is_empty())
                    .unwrap_or_else(|| parsed.name.clone());

                let path = torrents_dir.join(format!(
                    "{}-{}.torrent",
                    sanitize_file_name(&base_name),
                    parsed.info_hash
                ));
                write_descriptor(&path, &bytes).await?;

                info!(
                    info_hash = %parsed.info_hash,
                    path = %path.display(),
                    "Saved torrent descriptor"
                );
                Ok(path)
            })
            .await
    }
}

async fn fetch_descriptor(
    client: &Client,
    url: &str,
) -> Result<(Vec<u8>, Option<String>), ResolveError> {
    debug!(url = %url, "Fetching torrent descriptor");

    let response = client.get(url).send().await.map_err(|e| classify(url, e))?;

    if !response.status().is_success() {
        return Err(ResolveError::Fetch(format!(
            "{} returned HTTP {}",
            url,
            response.status()
        )));
    }

    let disposition = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let bytes = response.bytes().await.map_err(|e| classify(url, e))?;
    Ok((bytes.to_vec(), disposition))
}

fn classify(url: &str, e: reqwest::Error) -> ResolveError {
    if e.is_timeout() {
        ResolveError::Timeout(url.to_string())
    } else {
        ResolveError::Fetch(format!("{}: {}", url, e))
    }
}

async fn write_descriptor(path: &Path, bytes: &[u8]) -> Result<(), ResolveError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ResolveError::Io(format!("{}: {}", parent.display(), e)))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| ResolveError::Io(format!("{}: {}", path.display(), e)))
}

/// Extract the filename from a content-disposition header value.
/// RFC 5987 `filename*` wins over plain `filename`.
fn filename_from_disposition(header: &str) -> Option<String> {
    let mut plain = None;

    for part in header.split(';').map(str::trim) {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"');

        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                let encoded = value.rsplit("''").next().unwrap_or(value);
                if let Ok(decoded) = urlencoding::decode(encoded) {
                    return Some(decoded.into_owned());
                }
            }
            "filename" => plain = Some(value.to_string()),
            _ => {}
        }
    }

    plain
}

fn strip_torrent_extension(file_name: &str) -> &str {
    let len = file_name.len();
    if len >= 8 && file_name.is_char_boundary(len - 8) && file_name[len - 8..].eq_ignore_ascii_case(".torrent") {
        &file_name[..len - 8]
    } else {
        file_name
    }
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect()
}
