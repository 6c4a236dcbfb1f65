//! Error bodies and status mapping shared by the handlers.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use torrentcast_core::{ResolveError, SourceError, StoreError, StreamError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// HTTP status for a playback failure.
pub fn stream_error_status(error: &StreamError) -> StatusCode {
    match error {
        StreamError::NotFound(_) | StreamError::Store(StoreError::NotFound(_)) => {
            StatusCode::NOT_FOUND
        }
        StreamError::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
        StreamError::Source(SourceError::Timeout(_))
        | StreamError::Source(SourceError::Resolve(ResolveError::Timeout(_)))
        | StreamError::Resolve(ResolveError::Timeout(_))
        | StreamError::Store(StoreError::Descriptor(ResolveError::Timeout(_))) => {
            StatusCode::GATEWAY_TIMEOUT
        }
        StreamError::Source(_) | StreamError::Resolve(_) => StatusCode::BAD_GATEWAY,
        StreamError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Error body for a playback failure. Unsatisfiable ranges also carry
/// `Content-Range: bytes */{size}`.
pub fn stream_error_response(error: StreamError) -> Response {
    let status = stream_error_status(&error);
    let mut response = error_response(status, error.to_string());

    if let StreamError::RangeNotSatisfiable { file_size } = error {
        if let Ok(value) = HeaderValue::from_str(&format!("bytes */{}", file_size)) {
            response.headers_mut().insert(header::CONTENT_RANGE, value);
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_error_status_mapping() {
        assert_eq!(
            stream_error_status(&StreamError::NotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            stream_error_status(&StreamError::Store(StoreError::NotFound("x".into()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            stream_error_status(&StreamError::Source(SourceError::Auth("x".into()))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            stream_error_status(&StreamError::Resolve(ResolveError::Timeout("x".into()))),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            stream_error_status(&StreamError::Store(StoreError::Engine("x".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_range_error_carries_content_range() {
        let response = stream_error_response(StreamError::RangeNotSatisfiable { file_size: 1000 });

        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(
            response.headers().get(header::CONTENT_RANGE).unwrap(),
            "bytes */1000"
        );
    }
}
