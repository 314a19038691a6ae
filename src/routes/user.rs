//! `GET /api/auth/user` — verified identity echo.
//!
//! Authenticates manually instead of going through the gate so its
//! upstream handling can differ: when the identity service is configured,
//! an upstream refusal is a hard 403 here, unlike the soft-fail canonical
//! resolver used elsewhere. A transport failure reads as "could not
//! authenticate" and stays a 401.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::debug;

use super::cookie_header;
use crate::auth::{IdentityError, UpstreamMe, extract_token, middleware::unauthorized_response};
use crate::router::AppState;

/// `GET /api/auth/user`
pub async fn get_user(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(token) = extract_token(&headers, &state.settings.auth_cookie_name) else {
        return unauthorized_response();
    };
    let user = match state.verifier.verify(&token) {
        Ok(user) => user,
        Err(err) => {
            if state.settings.auth_debug {
                debug!(error = %err, "user info: verification failed");
            }
            return unauthorized_response();
        }
    };

    let mut upstream = UpstreamMe::default();
    if state.identity.is_configured() {
        match state.identity.fetch_me(cookie_header(&headers)).await {
            Ok(me) => upstream = me,
            Err(IdentityError::Transport(err)) => {
                if state.settings.auth_debug {
                    debug!(error = %err, "user info: upstream unreachable");
                }
                return unauthorized_response();
            }
            Err(err) => {
                if state.settings.auth_debug {
                    debug!(error = %err, "user info: upstream refused");
                }
                return (
                    StatusCode::FORBIDDEN,
                    Json(json!({ "error": "Forbidden" })),
                )
                    .into_response();
            }
        }
    }

    Json(json!({
        "id": upstream.id.unwrap_or(user.id),
        "email": upstream.email.or(user.email),
        "active": true,
        "roles": user.roles.unwrap_or_default(),
        "tenantId": user.tenant_id,
    }))
    .into_response()
}
