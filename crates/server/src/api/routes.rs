use axum::{
    routing::{delete, get},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, play, sources, streams, torrents};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Sources
        .route("/sources/issues", get(sources::list_issues))
        // Store
        .route("/torrents", get(torrents::list_torrents))
        .route("/torrents/{hash}", delete(torrents::delete_torrent))
        // Streams and playback
        .route("/{requester}/stream/{media_type}/{id}", get(streams::get_streams))
        .route(
            "/{requester}/play/{source}/{source_id}/{info_hash}/{file_index}",
            get(play::play).head(play::head_play),
        )
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
