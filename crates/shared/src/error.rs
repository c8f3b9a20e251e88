//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Caller is not the allowed address.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// File, folder or backend not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or invalid request field.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Target already exists (e.g. folder creation).
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Upload exceeds the configured size limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Requested byte range cannot be served for a file of `size` bytes.
    #[error("Range not satisfiable for {size} byte file")]
    RangeNotSatisfiable {
        /// Total size of the file in bytes.
        size: u64,
    },

    /// Transport or authentication failure talking to a backend.
    #[error("Backend connection error: {0}")]
    Connection(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) | Self::AlreadyExists(_) => 400,
            Self::PayloadTooLarge(_) => 413,
            Self::RangeNotSatisfiable { .. } => 416,
            Self::Connection(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::RangeNotSatisfiable { .. } => "RANGE_NOT_SATISFIABLE",
            Self::Connection(_) => "CONNECTION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
