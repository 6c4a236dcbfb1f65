//! Range streaming of torrent files.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::debug;
use torrentcast_core::streaming::{reader_stream, PlayableFile};

use super::error::{error_response, stream_error_response};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PlayPath {
    pub requester: String,
    pub source: String,
    pub source_id: String,
    pub info_hash: String,
    pub file_index: usize,
}

/// Resolve the requested file after checking the requester.
async fn resolve_file(state: &AppState, path: &PlayPath) -> Result<PlayableFile, Response> {
    if state
        .preferences()
        .preference_for(&path.requester)
        .await
        .is_none()
    {
        debug!(requester = %path.requester, "Unknown requester");
        return Err(error_response(StatusCode::UNAUTHORIZED, "Unknown requester"));
    }

    state
        .streams()
        .playable_file(&path.source, &path.source_id, &path.info_hash, path.file_index)
        .await
        .map_err(stream_error_response)
}

fn content_type(file: &PlayableFile) -> HeaderValue {
    let mime = mime_guess::from_path(&file.path).first_or_octet_stream();
    HeaderValue::from_str(mime.essence_str())
        .unwrap_or(HeaderValue::from_static("application/octet-stream"))
}

/// HEAD /api/v1/{requester}/play/{source}/{source_id}/{info_hash}/{file_index}
///
/// Size and MIME type of the file, without a body.
pub async fn head_play(
    State(state): State<Arc<AppState>>,
    Path(path): Path<PlayPath>,
) -> Response {
    let file = match resolve_file(&state, &path).await {
        Ok(file) => file,
        Err(response) => return response,
    };

    (
        StatusCode::OK,
        [
            (header::CONTENT_LENGTH, HeaderValue::from(file.length)),
            (header::CONTENT_TYPE, content_type(&file)),
            (header::ACCEPT_RANGES, HeaderValue::from_static("bytes")),
        ],
    )
        .into_response()
}

/// GET /api/v1/{requester}/play/{source}/{source_id}/{info_hash}/{file_index}
///
/// Stream the span named by the `Range` header. Requests without a usable
/// range get 416.
pub async fn play(
    State(state): State<Arc<AppState>>,
    Path(path): Path<PlayPath>,
    headers: HeaderMap,
) -> Response {
    let file = match resolve_file(&state, &path).await {
        Ok(file) => file,
        Err(response) => return response,
    };

    let range_header = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    let range = match state.streams().range_for(&file, range_header) {
        Ok(range) => range,
        Err(e) => return stream_error_response(e),
    };

    let reader = match state.streams().open_range(&file, range).await {
        Ok(reader) => reader,
        Err(e) => return stream_error_response(e),
    };

    let content_range = match HeaderValue::from_str(&range.content_range(file.length)) {
        Ok(value) => value,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    (
        StatusCode::PARTIAL_CONTENT,
        [
            (header::CONTENT_RANGE, content_range),
            (header::ACCEPT_RANGES, HeaderValue::from_static("bytes")),
            (
                header::CONTENT_LENGTH,
                HeaderValue::from(range.content_length()),
            ),
            (header::CONTENT_TYPE, content_type(&file)),
        ],
        Body::from_stream(reader_stream(reader)),
    )
        .into_response()
}
