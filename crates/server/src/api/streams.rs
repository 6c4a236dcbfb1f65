//! Stream listing for a movie or an episode.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::debug;
use torrentcast_core::{MediaQuery, MediaType, StreamEntry};

use super::error::error_response;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StreamsResponse {
    pub streams: Vec<StreamEntry>,
}

/// Parse a media id of the form `tt123` (movies) or `tt123:season:episode`
/// (series), with an optional `.json` suffix.
pub fn parse_media_query(media_type: &str, id: &str) -> Result<MediaQuery, String> {
    let media_type: MediaType = media_type.parse()?;
    let id = id.strip_suffix(".json").unwrap_or(id);
    let parts: Vec<&str> = id.split(':').collect();

    let media_id = parts[0];
    if !media_id.starts_with("tt") || media_id.len() <= 2 {
        return Err(format!("ID must start with 'tt', got '{}'", media_id));
    }

    match (media_type, parts.as_slice()) {
        (MediaType::Movie, [_]) => Ok(MediaQuery::movie(media_id)),
        (MediaType::Movie, _) => Err(format!("movie ID cannot carry an episode: '{}'", id)),
        (MediaType::Series, [_, season, episode]) => {
            let season = season
                .parse()
                .map_err(|_| format!("invalid season '{}'", season))?;
            let episode = episode
                .parse()
                .map_err(|_| format!("invalid episode '{}'", episode))?;
            Ok(MediaQuery::episode(media_id, season, episode))
        }
        (MediaType::Series, _) => Err(format!(
            "series ID must have the form tt123:season:episode, got '{}'",
            id
        )),
    }
}

/// GET /api/v1/{requester}/stream/{type}/{id}
///
/// Ranked streams for a movie or an episode, using the requester's preferences.
pub async fn get_streams(
    State(state): State<Arc<AppState>>,
    Path((requester, media_type, id)): Path<(String, String, String)>,
) -> Response {
    let query = match parse_media_query(&media_type, &id) {
        Ok(query) => query,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let Some(preference) = state.preferences().preference_for(&requester).await else {
        debug!(requester = %requester, "Unknown requester");
        return error_response(StatusCode::UNAUTHORIZED, "Unknown requester");
    };

    let streams = state
        .streams()
        .streams_for(&query, &requester, &preference)
        .await;

    Json(StreamsResponse { streams }).into_response()
}
