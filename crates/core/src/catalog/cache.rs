//! Directory listing caching using Moka.
//!
//! Optional time-bounded memoization of per-backend listings, keyed by
//! backend id and folder. Disabled unless a TTL is configured.
//!
//! Every invalidation bumps a generation counter. A listing started under
//! an older generation is not kept, so a listing that raced a mutation
//! never outlives it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use galleria_shared::CacheConfig;
use moka::future::Cache;

use super::service::BackendListing;

/// Cache for backend listings.
///
/// Thread-safe and cheap to clone; clones share entries.
#[derive(Clone)]
pub struct ListingCache {
    cache: Cache<(String, String), Arc<BackendListing>>,
    generation: Arc<AtomicU64>,
}

impl ListingCache {
    /// Creates a listing cache.
    ///
    /// # Arguments
    ///
    /// * `max_capacity` - Maximum number of (backend, folder) listings
    /// * `ttl_secs` - Time-to-live in seconds for each listing
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            cache,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Creates the cache described by settings, `None` when the TTL is zero.
    #[must_use]
    pub fn from_settings(settings: &CacheConfig) -> Option<Self> {
        (settings.ttl_secs > 0)
            .then(|| Self::with_config(settings.max_capacity, settings.ttl_secs))
    }

    /// Cached listing of `folder` on `backend`, if still fresh.
    pub async fn get(&self, backend: &str, folder: &str) -> Option<Arc<BackendListing>> {
        self.cache
            .get(&(backend.to_string(), folder.to_string()))
            .await
    }

    /// Current invalidation generation. Read it before listing a backend.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Stores a listing taken under `generation` and returns the shared
    /// handle.
    ///
    /// The entry is dropped again if an invalidation happened since.
    pub async fn insert(
        &self,
        backend: &str,
        folder: &str,
        listing: BackendListing,
        generation: u64,
    ) -> Arc<BackendListing> {
        let key = (backend.to_string(), folder.to_string());
        let listing = Arc::new(listing);
        self.cache.insert(key.clone(), listing.clone()).await;
        if self.generation() != generation {
            self.cache.invalidate(&key).await;
        }
        listing
    }

    /// Drops every cached listing. Called after any mutation.
    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate_all();
    }
}
