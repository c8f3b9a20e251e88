//! Catalog building across backends.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use super::cache::ListingCache;
use super::types::{Catalog, MediaItem, MediaKind, UploadDate, sort_newest_first};
use crate::storage::{Backend, BackendRegistry, BackendSession, RawEntry, StorageError, path};

/// Media items and sub-folders of one folder on one backend.
#[derive(Debug, Clone, Default)]
pub struct BackendListing {
    /// Media items in listing order.
    pub items: Vec<MediaItem>,
    /// Sub-folder names.
    pub folders: Vec<String>,
}

/// Builds gallery catalogs from the configured backends.
#[derive(Clone)]
pub struct CatalogService {
    registry: Arc<BackendRegistry>,
    cache: Option<ListingCache>,
}

impl CatalogService {
    /// Create a catalog service without listing cache.
    #[must_use]
    pub fn new(registry: Arc<BackendRegistry>) -> Self {
        Self {
            registry,
            cache: None,
        }
    }

    /// Attach a listing cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Option<ListingCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Build the catalog of `folder` (root when `None`).
    ///
    /// Backends are listed concurrently. A backend that cannot be reached or
    /// listed contributes nothing; the build itself only fails on an invalid
    /// folder path.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidPath`] for traversal attempts.
    pub async fn build_catalog(&self, folder: Option<&str>) -> Result<Catalog, StorageError> {
        let folder = path::normalize(folder.unwrap_or_default())?;

        let listings = join_all(self.registry.all().iter().map(|backend| {
            let folder = folder.as_str();
            async move { (backend.id(), self.listing(backend, folder).await) }
        }))
        .await;

        let mut items = Vec::new();
        let mut folders = BTreeSet::new();
        for (backend, listing) in listings {
            match listing {
                Ok(listing) => {
                    items.extend(listing.items.iter().cloned());
                    folders.extend(listing.folders.iter().cloned());
                }
                Err(e) => {
                    warn!(backend = %backend, folder = %folder, error = %e, "Backend skipped in catalog");
                }
            }
        }

        sort_newest_first(&mut items);
        debug!(folder = %folder, items = items.len(), "Catalog built");

        Ok(Catalog {
            folder,
            items,
            folders: folders.into_iter().collect(),
        })
    }

    async fn listing(
        &self,
        backend: &Backend,
        folder: &str,
    ) -> Result<Arc<BackendListing>, StorageError> {
        let Some(cache) = &self.cache else {
            return list_backend(backend, folder).await.map(Arc::new);
        };

        if let Some(listing) = cache.get(backend.id(), folder).await {
            return Ok(listing);
        }
        let generation = cache.generation();
        let listing = list_backend(backend, folder).await?;
        Ok(cache.insert(backend.id(), folder, listing, generation).await)
    }
}

/// List one folder of one backend into media items.
///
/// Holds one session for the whole listing and releases it on return.
///
/// # Errors
///
/// Returns an error if the backend cannot be reached or the folder listed.
pub async fn list_backend(backend: &Backend, folder: &str) -> Result<BackendListing, StorageError> {
    let session = backend.connect().await?;
    let entries = session.list(folder).await?;

    let mut listing = BackendListing::default();
    for entry in entries {
        if entry.is_dir {
            listing.folders.push(entry.name);
            continue;
        }
        let Some(kind) = MediaKind::from_filename(&entry.name) else {
            continue;
        };
        let (size, upload_date) = resolve_metadata(&session, &entry).await;
        listing
            .items
            .push(MediaItem::new(backend.id(), &entry.path, size, upload_date, kind));
    }

    Ok(listing)
}

/// Size and date of one entry; falls back to `(0, Unknown)` on failure.
async fn resolve_metadata(session: &BackendSession, entry: &RawEntry) -> (u64, UploadDate) {
    if let Some(meta) = &entry.meta {
        return (meta.size, UploadDate::from_optional(meta.modified.as_deref()));
    }

    match session.stat(&entry.path).await {
        Ok(meta) => (meta.size, UploadDate::from_optional(meta.modified.as_deref())),
        Err(e) => {
            warn!(
                backend = %session.backend_id(),
                path = %entry.path,
                error = %e,
                "Failed to read metadata, using defaults"
            );
            (0, UploadDate::Unknown)
        }
    }
}
