//! Storage error types.

use galleria_shared::AppError;
use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend unreachable, handshake failed or transport broke mid-operation.
    #[error("backend '{backend}' connection failed: {message}")]
    Connection {
        /// Backend id.
        backend: String,
        /// Underlying error.
        message: String,
    },

    /// File or directory not found.
    #[error("not found: {path}")]
    NotFound {
        /// Path that was not found.
        path: String,
    },

    /// Target already exists.
    #[error("already exists: {path}")]
    AlreadyExists {
        /// Path that already exists.
        path: String,
    },

    /// Requested byte range does not fit the file.
    #[error("range not satisfiable for {size} byte file")]
    RangeNotSatisfiable {
        /// Total file size.
        size: u64,
    },

    /// File size exceeds maximum allowed.
    #[error("file size {size} bytes exceeds maximum allowed {max} bytes")]
    FileTooLarge {
        /// Bytes received before rejection.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// Path contains traversal or otherwise unusable segments.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Create a connection error.
    #[must_use]
    pub fn connection(backend: impl Into<String>, message: impl ToString) -> Self {
        Self::Connection {
            backend: backend.into(),
            message: message.to_string(),
        }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create an already exists error.
    #[must_use]
    pub fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists { path: path.into() }
    }

    /// Create a file too large error.
    #[must_use]
    pub fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }

    /// Create an invalid path error.
    #[must_use]
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Map an OpenDAL error raised by `backend` while working on `path`.
    #[must_use]
    pub fn from_opendal(backend: &str, path: &str, err: &opendal::Error) -> Self {
        use opendal::ErrorKind;

        match err.kind() {
            ErrorKind::NotFound | ErrorKind::IsADirectory | ErrorKind::NotADirectory => {
                Self::not_found(path)
            }
            ErrorKind::AlreadyExists => Self::already_exists(path),
            ErrorKind::ConfigInvalid => Self::configuration(err.to_string()),
            ErrorKind::Unexpected | ErrorKind::PermissionDenied | ErrorKind::RateLimited => {
                Self::connection(backend, err)
            }
            _ if err.is_temporary() => Self::connection(backend, err),
            _ => Self::Operation(err.to_string()),
        }
    }

    /// Map an I/O error raised while streaming `path` from `backend`.
    ///
    /// OpenDAL wraps its own error inside the I/O error of a byte stream;
    /// that error is mapped as usual.
    #[must_use]
    pub fn from_io(backend: &str, path: &str, err: &std::io::Error) -> Self {
        if let Some(inner) = err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<opendal::Error>())
        {
            return Self::from_opendal(backend, path, inner);
        }
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(path),
            _ => Self::connection(backend, err),
        }
    }

    /// Whether this is a missing file or directory.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { .. } => Self::NotFound(err.to_string()),
            StorageError::AlreadyExists { .. } => Self::AlreadyExists(err.to_string()),
            StorageError::RangeNotSatisfiable { size } => Self::RangeNotSatisfiable { size },
            StorageError::FileTooLarge { .. } => Self::PayloadTooLarge(err.to_string()),
            StorageError::InvalidPath(_) | StorageError::Validation(_) => {
                Self::Validation(err.to_string())
            }
            StorageError::Connection { .. } => Self::Connection(err.to_string()),
            StorageError::Configuration(_) | StorageError::Operation(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}
