//! Tools registry CRUD.
//!
//! Listing and reading are open to any authenticated user. Creation is
//! open too, but non-admins are silently demoted to HARD_CODED entries;
//! deletion is admin-only. The admin check here uses the token-derived
//! id, not the canonical id; see DESIGN.md.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{non_empty, parse_json};
use crate::auth::CurrentUser;
use crate::router::AppState;
use crate::store::models::{RegistryRow, Tag, ToolType};
use crate::store::queries::{self, NewRegistry};
use crate::{Error, Result};

/// Query filters for the registry listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Filter by tool type
    #[serde(rename = "type")]
    pub tool_type: Option<String>,
    /// Filter by tag name
    pub tag: Option<String>,
}

fn entry_json(row: &RegistryRow, tags: &[Tag]) -> Value {
    json!({
        "id": row.id,
        "explicitCallName": row.explicit_call_name,
        "readableName": row.readable_name,
        "description": row.description,
        "toolType": row.tool_type,
        "tags": tags,
        "createdAt": row.created_at,
        "updatedAt": row.updated_at,
    })
}

/// `GET /api/tools/registry`
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>> {
    let tool_type = match query.tool_type.as_deref() {
        Some(raw) => Some(ToolType::parse(raw).ok_or(Error::BadRequest("invalid_tool_type"))?),
        None => None,
    };

    let entries = queries::list_registry(&state.db, tool_type, query.tag.as_deref()).await?;
    let mapped: Vec<Value> = entries
        .iter()
        .map(|(row, tags)| entry_json(row, tags))
        .collect();
    Ok(Json(Value::Array(mapped)))
}

/// Create body for a bare registry entry.
#[derive(Debug, Default, Deserialize)]
pub struct CreateBody {
    /// Unique machine-facing call name
    #[serde(default)]
    pub explicit_call_name: Option<String>,
    /// Human-facing label
    #[serde(default)]
    pub readable_name: Option<String>,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Entry kind (defaults to HARD_CODED)
    #[serde(default)]
    pub tool_type: Option<String>,
    /// Tags to attach
    #[serde(default)]
    pub tag_ids: Option<Vec<String>>,
}

/// `POST /api/tools/registry`
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Response> {
    let body: CreateBody = parse_json(&body, "Invalid JSON")?;

    let admin = queries::is_admin(&state.db, &user.id).await?;

    let Some(explicit_call_name) = non_empty(body.explicit_call_name) else {
        return Err(Error::BadRequest("Missing required fields"));
    };
    let Some(readable_name) = non_empty(body.readable_name) else {
        return Err(Error::BadRequest("Missing required fields"));
    };

    let mut tool_type = body
        .tool_type
        .as_deref()
        .and_then(ToolType::parse)
        .unwrap_or(ToolType::HardCoded);
    // USER may only create HARD_CODED entries
    if !admin {
        tool_type = ToolType::HardCoded;
    }

    let new = NewRegistry {
        explicit_call_name,
        readable_name,
        description: non_empty(body.description),
        tool_type,
    };
    let tag_ids = body.tag_ids.unwrap_or_default();

    let id = queries::create_registry(&state.db, &new, &tag_ids).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))).into_response())
}

/// `GET /api/tools/registry/{id}`
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let row = queries::get_registry(&state.db, &id)
        .await?
        .ok_or(Error::NotFound("Not found"))?;
    Ok(Json(json!({
        "id": row.id,
        "explicitCallName": row.explicit_call_name,
        "readableName": row.readable_name,
        "toolType": row.tool_type,
        "createdAt": row.created_at,
        "updatedAt": row.updated_at,
    })))
}

/// Patch body for registry renames.
#[derive(Debug, Default, Deserialize)]
pub struct PatchBody {
    /// New call name
    #[serde(default)]
    pub explicit_call_name: Option<String>,
    /// New label
    #[serde(default)]
    pub readable_name: Option<String>,
    /// Present only to be rejected; type changes are forbidden
    #[serde(default)]
    pub tool_type: Option<String>,
}

/// `PATCH /api/tools/registry/{id}`
pub async fn patch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>> {
    let body: PatchBody = parse_json(&body, "Invalid JSON")?;
    if body.tool_type.is_some() {
        return Err(Error::BadRequest("tool_type_change_forbidden"));
    }

    let explicit_call_name = non_empty(body.explicit_call_name);
    let readable_name = non_empty(body.readable_name);
    queries::update_registry_names(
        &state.db,
        &id,
        explicit_call_name.as_deref(),
        readable_name.as_deref(),
    )
    .await?;
    Ok(Json(json!({ "id": id })))
}

/// `DELETE /api/tools/registry/{id}` — admin only.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    if !queries::is_admin(&state.db, &user.id).await? {
        return Err(Error::Forbidden);
    }
    queries::delete_registry(&state.db, &id).await?;
    Ok(Json(json!({ "ok": true })))
}
