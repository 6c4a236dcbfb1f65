//! [`TorrentSource`] implementation for nCore.

use async_trait::async_trait;
use chrono::Utc;
use futures::future::try_join_all;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::{redirect, Client};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::categories::{categories_for, category_label, category_language, category_resolution};
use super::html::{download_href, removable_torrent_ids};
use super::page::{NcorePage, NcoreTorrent};
use super::session::{parse_session, LoginCookie, SessionStore};
use crate::config::NcoreConfig;
use crate::descriptor::DescriptorResolver;
use crate::source::{
    process_in_batches, MediaQuery, SourceError, TorrentCandidate, TorrentSource,
};

pub const LOGIN_FAILED_MESSAGE: &str =
    "Failed to log in to nCore. Check your credentials in the environment variables.";

/// How a listing query matches torrents.
enum SearchField<'a> {
    Imdb(&'a str),
    Name(&'a str),
}

/// nCore client. Each instance owns its own session cache.
pub struct NcoreSource {
    config: NcoreConfig,
    base_url: String,
    client: Client,
    sessions: SessionStore,
    resolver: Arc<DescriptorResolver>,
}

impl NcoreSource {
    pub fn new(config: NcoreConfig, resolver: Arc<DescriptorResolver>) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| SourceError::Fetch(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            config,
            client,
            sessions: SessionStore::default(),
            resolver,
        })
    }

    /// Cookie header for an authenticated session, logging in when needed.
    async fn session_cookie(&self) -> Result<String, SourceError> {
        let (username, password) = (&self.config.username, &self.config.password);

        if let Some(cookie) = self.sessions.valid_cookie(username, password).await {
            return Ok(cookie);
        }

        let url = format!("{}/login.php", self.base_url);
        let response = self
            .client
            .post(&url)
            .form(&[
                ("set_lang", "hu"),
                ("submitted", "1"),
                ("nev", username.as_str()),
                ("pass", password.as_str()),
                ("ne_leptessen_ki", "1"),
            ])
            .send()
            .await
            .map_err(|e| SourceError::from_reqwest("nCore login", e))?;

        let now = Utc::now();
        let session = parse_session(
            response
                .cookies()
                .map(|cookie| LoginCookie::from_response(&cookie, now)),
        )?;
        info!(expires_at = ?session.expires_at, "Logged in to nCore");

        let cookie = session.cookie.clone();
        self.sessions.store(username, password, session).await;
        Ok(cookie)
    }

    async fn fetch_page(
        &self,
        cookie: &str,
        field: &SearchField<'_>,
        categories: &str,
        page: u64,
    ) -> Result<NcorePage, SourceError> {
        let (term, search_in) = match field {
            SearchField::Imdb(id) => (*id, "imdb"),
            SearchField::Name(title) => (*title, "name"),
        };
        let page = page.to_string();

        let response = self
            .client
            .get(format!("{}/torrents.php", self.base_url))
            .header(COOKIE, cookie)
            .query(&[
                ("mire", term),
                ("miben", search_in),
                ("miszerint", "seeders"),
                ("hogyan", "DESC"),
                ("tipus", "kivalasztottak_kozott"),
                ("kivalasztott_tipus", categories),
                ("jsons", "true"),
                ("oldal", page.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SourceError::from_reqwest("nCore search", e))?;

        if !response.status().is_success() {
            return Err(SourceError::Fetch(format!(
                "nCore search returned HTTP {}",
                response.status()
            )));
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));

        // An HTML page instead of JSON means "no results"
        if !is_json {
            debug!(term = %term, page = %page, "nCore returned no results");
            return Ok(NcorePage::default());
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("nCore search page: {}", e)))
    }

    /// Every page of results for a search.
    async fn search_all_pages(
        &self,
        field: SearchField<'_>,
        query: &MediaQuery,
    ) -> Result<Vec<NcoreTorrent>, SourceError> {
        let cookie = self.session_cookie().await?;
        let categories = categories_for(query.media_type).join(",");

        let first = self.fetch_page(&cookie, &field, &categories, 1).await?;
        let last_page = first.last_page();

        let rest = try_join_all(
            (2..=last_page).map(|page| self.fetch_page(&cookie, &field, &categories, page)),
        )
        .await?;

        let mut torrents = first.results;
        for page in rest {
            torrents.extend(page.results);
        }

        debug!(
            media_id = %query.media_id,
            pages = last_page,
            results = torrents.len(),
            "nCore search complete"
        );
        Ok(torrents)
    }

    /// Resolve each raw result's descriptor, throttled in batches.
    async fn into_candidates(&self, torrents: Vec<NcoreTorrent>) -> Vec<TorrentCandidate> {
        let resolver = &self.resolver;
        let resolved = process_in_batches(
            torrents,
            self.config.batch_size,
            Duration::from_millis(self.config.batch_delay_ms),
            |torrent| async move {
                let result = resolver.resolve(&torrent.download_url).await;
                (torrent, result)
            },
        )
        .await;

        resolved
            .into_iter()
            .filter_map(|(torrent, result)| match result {
                Ok(descriptor) => Some(TorrentCandidate {
                    source_name: self.id().to_string(),
                    source_id: torrent.torrent_id,
                    info_hash: descriptor.info_hash,
                    release_name: torrent.release_name,
                    language: category_language(&torrent.category),
                    quality_label: category_label(&torrent.category).to_string(),
                    fallback_resolution: category_resolution(&torrent.category),
                    files: descriptor.files,
                    seeders: torrent.seeders,
                    is_speculated: false,
                }),
                Err(e) => {
                    warn!(
                        torrent_id = %torrent.torrent_id,
                        url = %torrent.download_url,
                        error = %e,
                        "Failed to resolve torrent, skipping"
                    );
                    None
                }
            })
            .collect()
    }

    async fn fetch_html(&self, url: &str, context: &str) -> Result<String, SourceError> {
        let cookie = self.session_cookie().await?;
        let response = self
            .client
            .get(url)
            .header(COOKIE, cookie)
            .send()
            .await
            .map_err(|e| SourceError::from_reqwest(context, e))?;

        if !response.status().is_success() {
            return Err(SourceError::Fetch(format!(
                "{} returned HTTP {}",
                context,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| SourceError::from_reqwest(context, e))
    }
}

#[async_trait]
impl TorrentSource for NcoreSource {
    fn id(&self) -> &str {
        "ncore"
    }

    fn display_name(&self) -> &str {
        "nCore"
    }

    async fn find_by_external_id(
        &self,
        query: &MediaQuery,
    ) -> Result<Vec<TorrentCandidate>, SourceError> {
        let torrents = self
            .search_all_pages(SearchField::Imdb(&query.media_id), query)
            .await?;
        Ok(self.into_candidates(torrents).await)
    }

    async fn find_by_title(
        &self,
        title: &str,
        query: &MediaQuery,
    ) -> Result<Vec<TorrentCandidate>, SourceError> {
        let torrents = self.search_all_pages(SearchField::Name(title), query).await?;
        Ok(self.into_candidates(torrents).await)
    }

    async fn download_url(&self, source_id: &str) -> Result<Option<String>, SourceError> {
        let url = format!(
            "{}/torrents.php?action=details&id={}",
            self.base_url,
            urlencoding::encode(source_id)
        );
        let html = self.fetch_html(&url, "nCore details page").await?;

        Ok(download_href(&html)
            .map(|href| format!("{}/{}", self.base_url, href.trim_start_matches('/'))))
    }

    async fn removable_info_hashes(&self) -> Result<Vec<String>, SourceError> {
        let url = format!("{}/hitnrun.php?showall=true", self.base_url);
        let html = self.fetch_html(&url, "nCore hit-and-run page").await?;
        let ids = removable_torrent_ids(&html);

        debug!(count = ids.len(), "Found torrents without seeding obligations");

        let resolved = process_in_batches(
            ids,
            self.config.batch_size,
            Duration::from_millis(self.config.batch_delay_ms),
            |id| async move {
                let result = async {
                    let url = self
                        .download_url(&id)
                        .await?
                        .ok_or_else(|| SourceError::NotFound(format!("download link for {}", id)))?;
                    let descriptor = self.resolver.resolve(&url).await?;
                    Ok::<_, SourceError>(descriptor.info_hash)
                }
                .await;
                (id, result)
            },
        )
        .await;

        Ok(resolved
            .into_iter()
            .filter_map(|(id, result)| {
                result
                    .inspect_err(|e| warn!(torrent_id = %id, error = %e, "Failed to resolve removable torrent"))
                    .ok()
            })
            .collect())
    }

    async fn config_issue(&self) -> Option<String> {
        match self.session_cookie().await {
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "nCore health check failed");
                Some(LOGIN_FAILED_MESSAGE.to_string())
            }
        }
    }
}
