//! Error responses.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use galleria_core::storage::StorageError;
use galleria_shared::AppError;

/// Handler error rendered as `{ "error": <code>, "message": <text> }`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// Caller is not allowed to perform the request.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self(AppError::Forbidden(message.into()))
    }

    /// Missing or malformed input.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }

        let body = Json(json!({
            "error": self.0.error_code(),
            "message": self.0.to_string(),
        }));
        let mut response = (status, body).into_response();

        if let AppError::RangeNotSatisfiable { size } = self.0
            && let Ok(value) = HeaderValue::from_str(&format!("bytes */{size}"))
        {
            response.headers_mut().insert(header::CONTENT_RANGE, value);
        }
        response
    }
}
