//! Multipart upload route.

use std::pin::pin;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::StatusCode,
    routing::post,
};
use futures::TryStreamExt;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;

use crate::{AppState, error::ApiError};
use galleria_core::storage::StorageError;
use galleria_core::upload::{ReceivedFile, UploadRequest, UploadResult};

/// Room left in the request body for multipart framing and text fields.
pub const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Creates the upload route.
///
/// The body limit refuses requests that declare a length above the file
/// limit before anything is read.
pub fn routes(max_file_size: u64) -> Router<AppState> {
    let body_limit =
        usize::try_from(max_file_size.saturating_add(MULTIPART_OVERHEAD)).unwrap_or(usize::MAX);

    Router::new().route(
        "/upload",
        post(upload_file)
            .layer::<_, std::convert::Infallible>(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(body_limit)),
    )
}

/// POST `/upload`
///
/// Multipart fields: one file field, optional `storage` and `folder`.
/// Fields sent before the file are validated before its content is read;
/// fields sent after it are validated once it has been received.
async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResult>), ApiError> {
    let max = state.uploads.max_file_size();
    let mut request = UploadRequest::default();
    let mut received: Option<ReceivedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e, max))?
    {
        if let Some(file_name) = field.file_name().map(str::to_string) {
            if received.is_some() {
                return Err(ApiError::validation("only one file per upload"));
            }
            request.filename = file_name;
            state.uploads.check(&request)?;
            let chunks = pin!(field.map_err(|e| multipart_error(&e, max)));
            received = Some(state.uploads.receive(chunks).await?);
            continue;
        }

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "storage" | "folder" => {
                let value = field.text().await.map_err(|e| multipart_error(&e, max))?;
                let value = Some(value).filter(|v| !v.trim().is_empty());
                if name == "storage" {
                    request.storage = value;
                } else {
                    request.folder = value;
                }
            }
            _ => {}
        }
    }

    let Some(received) = received else {
        return Err(ApiError::validation("no file uploaded"));
    };

    let result = state.uploads.store(&request, &received).await?;
    info!(
        file = %result.file_name,
        size = result.size,
        destinations = ?result.destinations,
        "File uploaded"
    );
    Ok((StatusCode::OK, Json(result)))
}

fn multipart_error(err: &MultipartError, max: u64) -> StorageError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        StorageError::file_too_large(max.saturating_add(1), max)
    } else {
        StorageError::validation(err.body_text())
    }
}
