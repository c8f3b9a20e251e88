//! Media streaming with byte-range support.

use axum::{
    Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use futures::TryStreamExt;
use tracing::warn;

use crate::{AppState, error::ApiError};
use galleria_core::streaming::{MediaStream, StreamStatus};
use galleria_shared::AppError;

/// Creates the media routes, e.g. `/local/...`, `/media/...`, `/nextcloud/...`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/{backend}/{*path}", get(stream_media))
}

/// GET `/{backend}/{*path}`
async fn stream_media(
    State(state): State<AppState>,
    Path((backend, path)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    // A Range header that is not valid text is still a range request.
    let range = headers
        .get(header::RANGE)
        .map(|value| value.to_str().unwrap_or_default());

    let stream = state.gateway.stream(&backend, &path, range).await?;
    media_response(stream)
}

fn media_response(stream: MediaStream) -> Result<Response, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(stream.content_length()));
    headers.insert(header::CONTENT_TYPE, header_value(&stream.content_type)?);

    let status = match stream.status {
        StreamStatus::Full => StatusCode::OK,
        StreamStatus::Partial(_) => StatusCode::PARTIAL_CONTENT,
    };
    if let Some(content_range) = stream.content_range() {
        headers.insert(header::CONTENT_RANGE, header_value(&content_range)?);
    }

    // An error after the headers went out aborts the response body.
    let body = stream
        .body
        .inspect_err(|e| warn!(error = %e, "Media stream aborted"));
    Ok((status, headers, Body::from_stream(body)).into_response())
}

fn header_value(value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value)
        .map_err(|_| ApiError(AppError::Internal("failed to build response header".into())))
}
