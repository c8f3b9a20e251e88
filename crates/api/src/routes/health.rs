//! Health check endpoint.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Configured backend ids, in catalog order.
    pub backends: Vec<String>,
    /// Whether an allowed client address is configured.
    pub access_configured: bool,
}

/// GET `/health`
///
/// Does not contact the backends.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        backends: state
            .registry
            .all()
            .iter()
            .map(|b| b.id().to_string())
            .collect(),
        access_configured: state.policy.is_configured(),
    })
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
