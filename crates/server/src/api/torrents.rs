//! Torrent store API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};
use torrentcast_core::TorrentStats;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DeleteTorrentResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /api/v1/torrents
///
/// Progress summary of every managed torrent, sorted by name.
pub async fn list_torrents(State(state): State<Arc<AppState>>) -> Json<Vec<TorrentStats>> {
    Json(state.store().get_store_stats().await)
}

/// DELETE /api/v1/torrents/{hash}
///
/// Remove a torrent with its descriptor and downloaded content. Deleting a
/// torrent that is not managed succeeds.
pub async fn delete_torrent(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Json<DeleteTorrentResponse> {
    match state.store().delete_torrent(&hash).await {
        Ok(removed) => {
            info!(hash = %hash, removed, "Torrent delete requested");
            Json(DeleteTorrentResponse {
                success: true,
                error: None,
            })
        }
        Err(e) => {
            warn!(hash = %hash, error = %e, "Failed to delete torrent");
            Json(DeleteTorrentResponse {
                success: false,
                error: Some(e.to_string()),
            })
        }
    }
}
