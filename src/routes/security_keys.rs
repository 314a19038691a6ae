//! Security key CRUD. Admin-only throughout.
//!
//! The listing accepts ADMIN either from the token's roles claim or from
//! the store keyed by the *canonical* user id; the mutations check the
//! store with the *token-derived* id only. The asymmetry is deliberate;
//! it mirrors the system this one replaces and is flagged as a
//! correctness risk in DESIGN.md.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{cookie_header, parse_json, parse_json_lenient};
use crate::auth::CurrentUser;
use crate::router::AppState;
use crate::store::models::SecurityKey;
use crate::store::queries;
use crate::{Error, Result};

/// `GET /api/tools/security-keys`
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    let mut allowed = user.has_role("ADMIN");
    if !allowed {
        let canonical_id = state
            .identity
            .resolve(cookie_header(&headers), &user.id)
            .await;
        allowed = queries::is_admin(&state.db, &canonical_id).await?;
    }
    if !allowed {
        return Err(Error::Forbidden);
    }

    let keys = queries::list_security_keys(&state.db).await?;
    let mapped: Vec<Value> = keys
        .iter()
        .map(|k| {
            json!({
                "id": k.id,
                "system_name": k.system_name,
                "description": k.description,
            })
        })
        .collect();
    Ok(Json(Value::Array(mapped)))
}

/// Create body for a security key.
#[derive(Debug, Default, Deserialize)]
pub struct CreateBody {
    /// Unique system name
    #[serde(default)]
    pub system_name: Option<String>,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
}

/// `POST /api/tools/security-keys`
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Response> {
    if !queries::is_admin(&state.db, &user.id).await? {
        return Err(Error::Forbidden);
    }

    let body: CreateBody = parse_json_lenient(&body);
    let Some(system_name) = body
        .system_name
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
    else {
        return Err(Error::BadRequest("missing_system_name"));
    };

    let key = queries::create_security_key(
        &state.db,
        &system_name,
        body.description.as_deref().filter(|v| !v.is_empty()),
        &user.id,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": key.id }))).into_response())
}

/// Patch body: description only.
#[derive(Debug, Default, Deserialize)]
pub struct PatchBody {
    /// Replacement description (null clears it)
    #[serde(default)]
    pub description: Option<String>,
}

/// `PATCH /api/tools/security-keys/{id}`
pub async fn patch(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<SecurityKey>> {
    if !queries::is_admin(&state.db, &user.id).await? {
        return Err(Error::Forbidden);
    }
    let body: PatchBody = parse_json(&body, "Invalid JSON")?;
    let key = queries::update_security_key(&state.db, &id, body.description.as_deref()).await?;
    Ok(Json(key))
}

/// `DELETE /api/tools/security-keys/{id}`
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    if !queries::is_admin(&state.db, &user.id).await? {
        return Err(Error::Forbidden);
    }
    queries::delete_security_key(&state.db, &id).await?;
    Ok(Json(json!({ "ok": true })))
}
