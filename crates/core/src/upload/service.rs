//! Upload and folder management across backends.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;
use futures::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::types::{FolderReport, ReceivedFile, UploadRequest, UploadResult, spool_error};
use crate::catalog::ListingCache;
use crate::storage::{Backend, BackendRegistry, StorageError, path};

/// Resolved name, path and destinations of one upload.
struct UploadPlan {
    file_name: String,
    target: String,
    destinations: Vec<Arc<Backend>>,
}

/// Writes uploads and manages folders on the configured backends.
#[derive(Clone)]
pub struct UploadService {
    registry: Arc<BackendRegistry>,
    max_file_size: u64,
    default_destinations: Vec<String>,
    spool_dir: Option<PathBuf>,
    cache: Option<ListingCache>,
}

impl UploadService {
    /// Create an upload service with a per-file size limit.
    #[must_use]
    pub fn new(registry: Arc<BackendRegistry>, max_file_size: u64) -> Self {
        Self {
            registry,
            max_file_size,
            default_destinations: Vec::new(),
            spool_dir: None,
            cache: None,
        }
    }

    /// Backends written to when the client names none.
    #[must_use]
    pub fn with_default_destinations(mut self, destinations: Vec<String>) -> Self {
        self.default_destinations = destinations;
        self
    }

    /// Directory holding uploads while they are received. The system
    /// temporary directory when unset.
    #[must_use]
    pub fn with_spool_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.spool_dir = dir;
        self
    }

    /// Listing cache to invalidate after mutations.
    #[must_use]
    pub fn with_cache(mut self, cache: Option<ListingCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Per-file size limit in bytes.
    #[must_use]
    pub const fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Validate the request fields known before the file content.
    ///
    /// Destination fields that are still absent are not checked; [`store`]
    /// validates the complete request again.
    ///
    /// [`store`]: UploadService::store
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Validation`] or [`StorageError::InvalidPath`]
    /// for a bad file name, folder or storage field.
    pub fn check(&self, request: &UploadRequest) -> Result<(), StorageError> {
        sanitize_filename(&request.filename)?;
        if let Some(folder) = &request.folder {
            path::normalize(folder)?;
        }
        if let Some(storage) = &request.storage {
            self.registry.select(Some(storage), &[])?;
        }
        Ok(())
    }

    /// Receive file content into a spool file, enforcing the size limit on
    /// every chunk.
    ///
    /// Stops reading as soon as the limit is exceeded. The spool file is
    /// removed when the returned [`ReceivedFile`] or the error is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::FileTooLarge`] past the limit, the first
    /// error of the stream, or an operation error if the spool fails.
    pub async fn receive<S>(&self, mut stream: S) -> Result<ReceivedFile, StorageError>
    where
        S: Stream<Item = Result<Bytes, StorageError>> + Unpin,
    {
        let builder = {
            let mut builder = tempfile::Builder::new();
            builder.prefix("galleria-upload-");
            builder
        };
        let spool = match &self.spool_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| spool_error(&e))?;
        let (file, spool) = spool.into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut size = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            size += chunk.len() as u64;
            if size > self.max_file_size {
                return Err(StorageError::file_too_large(size, self.max_file_size));
            }
            file.write_all(&chunk).await.map_err(|e| spool_error(&e))?;
        }
        file.flush().await.map_err(|e| spool_error(&e))?;

        debug!(size, spool = %spool.display(), "Upload received");
        Ok(ReceivedFile::new(spool, size))
    }

    /// Write a received file to every selected backend.
    ///
    /// Existing files are overwritten. Every destination is attempted.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Validation`] for a missing name or unknown storage
    /// - [`StorageError::FileTooLarge`] past the size limit
    /// - The first destination failure, in selection order
    pub async fn store(
        &self,
        request: &UploadRequest,
        received: &ReceivedFile,
    ) -> Result<UploadResult, StorageError> {
        if received.size() > self.max_file_size {
            return Err(StorageError::file_too_large(received.size(), self.max_file_size));
        }
        let plan = self.plan(request)?;
        self.write(plan, received).await
    }

    fn plan(&self, request: &UploadRequest) -> Result<UploadPlan, StorageError> {
        let file_name = sanitize_filename(&request.filename)?;
        let folder = path::normalize(request.folder.as_deref().unwrap_or_default())?;
        let target = path::join(&folder, &file_name)?;
        let destinations = self
            .registry
            .select(request.storage.as_deref(), &self.default_destinations)?;
        Ok(UploadPlan {
            file_name,
            target,
            destinations,
        })
    }

    async fn write(
        &self,
        plan: UploadPlan,
        received: &ReceivedFile,
    ) -> Result<UploadResult, StorageError> {
        let UploadPlan {
            file_name,
            target,
            destinations,
        } = plan;

        let results = join_all(destinations.iter().map(|backend| {
            let target = target.as_str();
            async move {
                let session = backend.connect().await?;
                session.write(target, received.replay().await?).await
            }
        }))
        .await;
        self.invalidate_cache();

        let mut first_error = None;
        for (backend, result) in destinations.iter().zip(results) {
            if let Err(e) = result {
                warn!(backend = %backend.id(), path = %target, error = %e, "Upload failed");
                first_error.get_or_insert(e);
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        info!(
            path = %target,
            size = received.size(),
            destinations = destinations.len(),
            "Upload stored"
        );

        Ok(UploadResult {
            file_name,
            path: target,
            size: received.size(),
            destinations: destinations.iter().map(|b| b.id().to_string()).collect(),
        })
    }

    /// Create a folder on the selected backends (all when `storage` is absent).
    ///
    /// Local backends are handled first and report conflicts strictly.
    /// Remote backends are best-effort: failures are logged and reported.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Validation`] for an invalid name or unknown storage
    /// - [`StorageError::AlreadyExists`] if the folder exists on a local backend
    pub async fn create_folder(
        &self,
        name: &str,
        storage: Option<&str>,
    ) -> Result<FolderReport, StorageError> {
        let folder = folder_name(name)?;
        let backends = self.registry.select(storage, &[])?;
        let (local, remote): (Vec<_>, Vec<_>) =
            backends.into_iter().partition(|b| b.kind().is_local());

        let mut report = FolderReport::new(&folder);
        for backend in &local {
            let result = async {
                backend.connect().await?.make_directory(&folder).await
            }
            .await;
            if let Err(e) = result {
                self.invalidate_cache();
                return Err(e);
            }
            report.succeeded.push(backend.id().to_string());
        }

        let results = join_all(remote.iter().map(|backend| {
            let folder = folder.as_str();
            async move { backend.connect().await?.make_directory(folder).await }
        }))
        .await;
        for (backend, result) in remote.iter().zip(results) {
            match result {
                Ok(()) => report.succeeded.push(backend.id().to_string()),
                Err(e) => {
                    warn!(backend = %backend.id(), folder = %folder, error = %e, "Folder creation failed");
                    report.failure(backend.id(), e);
                }
            }
        }

        self.invalidate_cache();
        info!(folder = %folder, succeeded = report.succeeded.len(), failed = report.failed.len(), "Folder created");
        Ok(report)
    }

    /// Delete a folder and its content on the selected backends.
    ///
    /// Every backend is attempted; failures are logged and reported.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Validation`] for an invalid name or unknown
    /// storage.
    pub async fn delete_folder(
        &self,
        name: &str,
        storage: Option<&str>,
    ) -> Result<FolderReport, StorageError> {
        let folder = folder_name(name)?;
        let backends = self.registry.select(storage, &[])?;

        let results = join_all(backends.iter().map(|backend| {
            let folder = folder.as_str();
            async move {
                backend
                    .connect()
                    .await?
                    .remove_directory(folder, true)
                    .await
            }
        }))
        .await;

        let mut report = FolderReport::new(&folder);
        for (backend, result) in backends.iter().zip(results) {
            match result {
                Ok(()) => report.succeeded.push(backend.id().to_string()),
                Err(e) => {
                    warn!(backend = %backend.id(), folder = %folder, error = %e, "Folder deletion failed");
                    report.failure(backend.id(), e);
                }
            }
        }

        self.invalidate_cache();
        info!(folder = %folder, succeeded = report.succeeded.len(), failed = report.failed.len(), "Folder deleted");
        Ok(report)
    }

    fn invalidate_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
    }
}

/// Keep only the final component of a client file name.
///
/// # Errors
///
/// Returns [`StorageError::Validation`] if nothing usable remains.
pub fn sanitize_filename(raw: &str) -> Result<String, StorageError> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if name.is_empty() || name == "." || name == ".." || name.contains('\0') {
        return Err(StorageError::validation("a file name is required"));
    }
    Ok(name.to_string())
}

/// Validate a folder name: one non-empty path segment.
fn folder_name(raw: &str) -> Result<String, StorageError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(StorageError::validation("folderName is required"));
    }
    let normalized =
        path::normalize(name).map_err(|_| StorageError::validation("invalid folder name"))?;
    if normalized.is_empty() || normalized.contains('/') {
        return Err(StorageError::validation("invalid folder name"));
    }
    Ok(normalized)
}
