//! Media catalog.
//!
//! This module builds the gallery view of a folder:
//! - Media classification by extension allow-list
//! - Upload dates with an explicit `unknown` state
//! - Concurrent listing of every backend with per-backend failure isolation
//! - Newest-first ordering of the merged items
//! - Optional listing cache, invalidated by mutations

pub mod cache;
pub mod service;
pub mod types;

#[cfg(test)]
mod catalog_props;

pub use cache::ListingCache;
pub use service::{BackendListing, CatalogService, list_backend};
pub use types::{
    Catalog, IMAGE_EXTENSIONS, MediaItem, MediaKind, UploadDate, VIDEO_EXTENSIONS, media_url,
    sort_newest_first,
};
