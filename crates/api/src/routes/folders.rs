//! Folder management routes.

use axum::{Form, Json, Router, extract::State, routing::post};
use serde::Deserialize;

use crate::{AppState, error::ApiError};
use galleria_core::upload::FolderReport;

/// Creates the folder routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/create-folder", post(create_folder))
        .route("/delete-folder", post(delete_folder))
}

/// Form body of the folder routes.
#[derive(Debug, Default, Deserialize)]
pub struct FolderForm {
    /// Folder name, a single path segment.
    #[serde(rename = "folderName", default)]
    pub folder_name: Option<String>,
    /// Backend id or `all`; every backend when absent.
    #[serde(default)]
    pub storage: Option<String>,
}

impl FolderForm {
    fn storage(&self) -> Option<&str> {
        self.storage.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// POST `/create-folder`
async fn create_folder(
    State(state): State<AppState>,
    Form(form): Form<FolderForm>,
) -> Result<Json<FolderReport>, ApiError> {
    let name = form.folder_name.as_deref().unwrap_or_default();
    let report = state.uploads.create_folder(name, form.storage()).await?;
    Ok(Json(report))
}

/// POST `/delete-folder`
async fn delete_folder(
    State(state): State<AppState>,
    Form(form): Form<FolderForm>,
) -> Result<Json<FolderReport>, ApiError> {
    let name = form.folder_name.as_deref().unwrap_or_default();
    let report = state.uploads.delete_folder(name, form.storage()).await?;
    Ok(Json(report))
}
