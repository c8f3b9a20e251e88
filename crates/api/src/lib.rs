//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - Gallery page and JSON catalog routes
//! - Media streaming with byte ranges
//! - Upload and folder routes behind the access policy
//! - Error responses

pub mod error;
pub mod middleware;
pub mod render;
pub mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use galleria_core::access::AccessPolicy;
use galleria_core::catalog::{CatalogService, ListingCache};
use galleria_core::storage::BackendRegistry;
use galleria_core::streaming::StreamingGateway;
use galleria_core::upload::UploadService;
use galleria_shared::{AppConfig, AppError};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Configured storage backends.
    pub registry: Arc<BackendRegistry>,
    /// Catalog builder.
    pub catalog: CatalogService,
    /// Media streaming.
    pub gateway: StreamingGateway,
    /// Uploads and folder management.
    pub uploads: UploadService,
    /// Caller check for mutating routes.
    pub policy: AccessPolicy,
}

impl AppState {
    /// Wire every service from configuration and the backend registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the access policy settings are invalid.
    pub fn new(config: &AppConfig, registry: Arc<BackendRegistry>) -> Result<Self, AppError> {
        let policy = AccessPolicy::from_settings(&config.access)?;
        let cache = ListingCache::from_settings(&config.cache);

        let catalog = CatalogService::new(registry.clone()).with_cache(cache.clone());
        let gateway = StreamingGateway::new(registry.clone());
        let uploads = UploadService::new(registry.clone(), config.upload.max_file_size)
            .with_default_destinations(config.upload.default_destinations.clone())
            .with_spool_dir(config.upload.spool_dir.as_ref().map(PathBuf::from))
            .with_cache(cache);

        Ok(Self {
            registry,
            catalog,
            gateway,
            uploads,
            policy,
        })
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
