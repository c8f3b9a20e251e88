//! Gallery page and catalog endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::Html,
    routing::get,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError, render::render_gallery};
use galleria_core::catalog::Catalog;

/// Creates the gallery routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(gallery_page))
        .route("/gallery", get(gallery_page))
        .route("/api/gallery", get(gallery_json))
}

/// Folder selection shared by the gallery endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct FolderQuery {
    /// Folder to list; root when absent.
    pub folder: Option<String>,
}

/// GET `/` and `/gallery`
async fn gallery_page(
    State(state): State<AppState>,
    Query(query): Query<FolderQuery>,
) -> Result<Html<String>, ApiError> {
    let catalog = state.catalog.build_catalog(query.folder.as_deref()).await?;
    Ok(Html(render_gallery(&catalog)))
}

/// GET `/api/gallery`
async fn gallery_json(
    State(state): State<AppState>,
    Query(query): Query<FolderQuery>,
) -> Result<Json<Catalog>, ApiError> {
    let catalog = state.catalog.build_catalog(query.folder.as_deref()).await?;
    Ok(Json(catalog))
}
