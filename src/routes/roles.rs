//! `GET /api/auth/roles` — effective roles for the canonical user.

use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::HeaderMap};
use serde_json::{Value, json};

use super::cookie_header;
use crate::Result;
use crate::auth::CurrentUser;
use crate::router::AppState;
use crate::store::queries;

/// `GET /api/auth/roles`
///
/// Resolves the canonical user id first (soft-fail), then reads role
/// membership. A user with no recorded roles is reported as plain USER.
pub async fn get_roles(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    let canonical_id = state
        .identity
        .resolve(cookie_header(&headers), &user.id)
        .await;

    let names = queries::role_names_for_user(&state.db, &canonical_id).await?;
    let effective = if names.is_empty() {
        vec!["USER".to_string()]
    } else {
        names
    };

    Ok(Json(json!({ "roles": effective, "userId": canonical_id })))
}
