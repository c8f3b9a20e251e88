//! Upload and folder operation types.

use std::path::Path;

use futures::{StreamExt, TryStreamExt};
use serde::Serialize;
use tempfile::TempPath;
use tokio_util::io::ReaderStream;

use crate::storage::{ByteStream, StorageError};

/// Chunk size used when replaying a spooled upload to a backend.
const REPLAY_CHUNK_SIZE: usize = 256 * 1024;

/// An upload as described by the client form.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// Client supplied file name. Only the final component is kept.
    pub filename: String,
    /// Backend id or `all`; configured defaults when absent.
    pub storage: Option<String>,
    /// Destination folder; backend root when absent.
    pub folder: Option<String>,
}

/// File content fully received and within the size limit.
///
/// The content sits in a temporary spool file that is removed on drop.
#[derive(Debug)]
pub struct ReceivedFile {
    spool: TempPath,
    size: u64,
}

impl ReceivedFile {
    pub(crate) fn new(spool: TempPath, size: u64) -> Self {
        Self { spool, size }
    }

    /// Total size in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Location of the spool file.
    #[must_use]
    pub fn spool_path(&self) -> &Path {
        &self.spool
    }

    /// Read the content back from the start.
    ///
    /// Every call opens its own handle, so replays may run concurrently.
    pub(crate) async fn replay(&self) -> Result<ByteStream, StorageError> {
        let file = tokio::fs::File::open(&self.spool)
            .await
            .map_err(|e| spool_error(&e))?;
        Ok(ReaderStream::with_capacity(file, REPLAY_CHUNK_SIZE)
            .map_err(|e| spool_error(&e))
            .boxed())
    }
}

pub(crate) fn spool_error(err: &std::io::Error) -> StorageError {
    StorageError::Operation(format!("upload spool: {err}"))
}

/// Result of a stored upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResult {
    /// Sanitized file name.
    pub file_name: String,
    /// Backend path the file was written to.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// Backends holding the file.
    pub destinations: Vec<String>,
}

/// A backend on which a folder operation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderFailure {
    /// Backend id.
    pub backend: String,
    /// Error description.
    pub error: String,
}

/// Per-backend outcome of a folder operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FolderReport {
    /// Folder that was created or deleted.
    pub folder: String,
    /// Backends on which the operation succeeded.
    pub succeeded: Vec<String>,
    /// Backends on which it failed.
    pub failed: Vec<FolderFailure>,
}

impl FolderReport {
    pub(crate) fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            ..Self::default()
        }
    }

    pub(crate) fn failure(&mut self, backend: &str, error: impl ToString) {
        self.failed.push(FolderFailure {
            backend: backend.to_string(),
            error: error.to_string(),
        });
    }

    /// Whether every backend succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
