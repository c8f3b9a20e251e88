//! Access policy middleware for mutating routes.

use std::net::SocketAddr;

use axum::{
    RequestExt,
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::{AppState, error::ApiError};

/// Header carrying the original client address behind a reverse proxy.
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Rejects callers other than the configured address with 403.
///
/// Runs before the handler, so a denied request has no side effect. A
/// request without a known peer address is denied.
pub async fn access_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extract_parts::<ConnectInfo<SocketAddr>>()
        .await
        .ok()
        .map(|ConnectInfo(addr)| addr);
    let forwarded = request
        .headers()
        .get(FORWARDED_FOR)
        .and_then(|h| h.to_str().ok());

    let caller = state.policy.resolve_caller(forwarded, peer);
    if !state.policy.is_allowed(caller.as_deref()) {
        warn!(
            caller = caller.as_deref().unwrap_or("unknown"),
            path = %request.uri().path(),
            "Access denied"
        );
        return ApiError::forbidden("this client may not modify the gallery").into_response();
    }

    next.run(request).await
}
