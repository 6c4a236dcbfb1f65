//! Torrent source health.

use axum::{extract::State, Json};
use std::sync::Arc;
use torrentcast_core::ConfigIssue;

use crate::state::AppState;

/// GET /api/v1/sources/issues
///
/// Configuration problems reported by the torrent sources.
pub async fn list_issues(State(state): State<Arc<AppState>>) -> Json<Vec<ConfigIssue>> {
    Json(state.sources().config_issues().await)
}
