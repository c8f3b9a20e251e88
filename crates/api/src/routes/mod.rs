//! Route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::access_middleware};

pub mod folders;
pub mod gallery;
pub mod health;
pub mod media;
pub mod upload;

/// Creates the router with public and access-controlled routes.
#[allow(clippy::needless_pass_by_value)]
pub fn routes_with_state(state: AppState) -> Router<AppState> {
    // Mutating routes, gated before any side effect
    let protected_routes = Router::new()
        .merge(upload::routes(state.uploads.max_file_size()))
        .merge(folders::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            access_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(gallery::routes())
        .merge(media::routes())
        .merge(protected_routes)
}
