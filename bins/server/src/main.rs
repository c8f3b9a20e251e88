//! Galleria media server
//!
//! Main entry point for the gallery service.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use galleria_api::{AppState, create_router};
use galleria_core::storage::{BackendConfig, BackendRegistry};
use galleria_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "galleria=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;

    // Build storage backends
    let registry = BackendRegistry::from_configs(BackendConfig::from_settings(&config.backends))
        .context("failed to initialize storage backends")?;
    if registry.is_empty() {
        warn!("No storage backend configured, the gallery will be empty");
    }
    for backend in registry.all() {
        info!(backend = %backend.id(), kind = backend.kind().as_str(), "Storage backend configured");
    }

    let state = AppState::new(&config, Arc::new(registry))?;
    if !state.policy.is_configured() {
        warn!("access.allowed_address is not set, uploads and folder changes are disabled");
    }
    if config.access.trust_forwarded_header && config.access.trusted_proxies.is_empty() {
        warn!("access.trusted_proxies is empty, X-Forwarded-For is ignored");
    }

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
