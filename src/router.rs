//! HTTP router and shared application state

use std::sync::Arc;

use axum::{
    Json, Router, middleware,
    routing::{get, patch, post},
};
use serde_json::json;
use sqlx::SqlitePool;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::auth::{IdentityResolver, TokenVerifier, auth_middleware};
use crate::config::Settings;
use crate::proxy::AgnoProxy;
use crate::routes;

/// Shared application state, built once by the composition root and
/// injected into every handler.
pub struct AppState {
    /// Loaded settings
    pub settings: Settings,
    /// Relational store handle (process-wide pool)
    pub db: SqlitePool,
    /// Auth cookie verifier
    pub verifier: TokenVerifier,
    /// Canonical identity resolver
    pub identity: IdentityResolver,
    /// Agent backend proxy
    pub proxy: AgnoProxy,
}

/// Create the router.
///
/// `/health` and `/api/auth/user` sit outside the gate: the former is a
/// public probe, the latter does its own token handling. Everything else
/// under `/api` goes through the auth middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    let gated = Router::new()
        .route("/api/auth/roles", get(routes::roles::get_roles))
        .route("/api/tools", post(routes::tools::create))
        .route(
            "/api/tools/registry",
            get(routes::registry::list).post(routes::registry::create),
        )
        .route(
            "/api/tools/registry/{id}",
            get(routes::registry::get)
                .patch(routes::registry::patch)
                .delete(routes::registry::delete),
        )
        .route(
            "/api/tools/hardcoded",
            get(routes::hardcoded::list).post(routes::hardcoded::create),
        )
        .route(
            "/api/tools/hardcoded/{id}",
            get(routes::hardcoded::get)
                .patch(routes::hardcoded::patch)
                .delete(routes::hardcoded::delete),
        )
        .route("/api/tools/n8n", post(routes::n8n::create))
        .route("/api/tools/dust", post(routes::dust::create))
        .route(
            "/api/tools/security-keys",
            get(routes::security_keys::list).post(routes::security_keys::create),
        )
        .route(
            "/api/tools/security-keys/{id}",
            patch(routes::security_keys::patch).delete(routes::security_keys::delete),
        )
        .route("/api/tools/tags", get(routes::tags::list))
        .route("/api/agno/chat/completions", post(routes::agno::chat_completions))
        .route("/api/agno/sessions/{agent_id}", get(routes::agno::list_sessions))
        .route(
            "/api/agno/sessions/{agent_id}/{session_id}",
            get(routes::agno::get_session).delete(routes::agno::delete_session),
        )
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/auth/user", get(routes::user::get_user))
        .merge(gated)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /health` — public liveness probe.
async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
