//! Authorization gate — middleware that authenticates the auth cookie.
//!
//! Wraps the protected route tree: extracts the cookie, verifies it, and
//! injects the resulting [`CurrentUser`] as a request extension for
//! handlers to consume. Every failure collapses to the same opaque 401
//! body; the underlying cause is logged server-side only when `AUTH_DEBUG`
//! is enabled.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::debug;

use super::cookie::extract_token;
use crate::router::AppState;

/// Authentication middleware for the `/api` route tree.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_token(request.headers(), &state.settings.auth_cookie_name) else {
        if state.settings.auth_debug {
            debug!(path = %request.uri().path(), "no auth cookie");
        }
        return unauthorized_response();
    };

    match state.verifier.verify(&token) {
        Ok(user) => {
            if state.settings.auth_debug {
                debug!(user = %user.id, path = %request.uri().path(), "authenticated request");
            }
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => {
            if state.settings.auth_debug {
                debug!(error = %err, path = %request.uri().path(), "token verification failed");
            }
            unauthorized_response()
        }
    }
}

/// The single 401 shape every auth failure collapses to.
pub fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Unauthorized" })),
    )
        .into_response()
}
