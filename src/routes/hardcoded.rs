//! Hardcoded tool profile CRUD.
//!
//! Open to any authenticated user: hardcoded tools are the one type
//! regular users may manage. Creation requires an existing HARD_CODED
//! registry entry.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{parse_json, parse_json_lenient};
use crate::router::AppState;
use crate::store::models::{HardcodedTool, ToolType};
use crate::store::queries;
use crate::{Error, Result};

/// `GET /api/tools/hardcoded`
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<HardcodedTool>>> {
    let tools = queries::list_hardcoded(&state.db).await?;
    Ok(Json(tools))
}

/// Create body: registry id plus optional notes.
#[derive(Debug, Default, Deserialize)]
pub struct CreateBody {
    /// Registry entry to attach the profile to
    #[serde(default)]
    pub id: Option<String>,
    /// Operator notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// `POST /api/tools/hardcoded`
pub async fn create(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response> {
    let body: CreateBody = parse_json_lenient(&body);
    let Some(id) = body.id.filter(|v| !v.is_empty()) else {
        return Err(Error::BadRequest("missing_registry_id"));
    };

    let registry = queries::get_registry(&state.db, &id)
        .await?
        .ok_or(Error::NotFound("registry_not_found"))?;
    if ToolType::parse(&registry.tool_type) != Some(ToolType::HardCoded) {
        return Err(Error::BadRequest("type_mismatch"));
    }

    let notes = body.notes.filter(|v| !v.is_empty());
    queries::create_hardcoded(&state.db, &id, notes.as_deref()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "notes": notes })),
    )
        .into_response())
}

/// `GET /api/tools/hardcoded/{id}`
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<HardcodedTool>> {
    let tool = queries::get_hardcoded(&state.db, &id)
        .await?
        .ok_or(Error::NotFound("Not found"))?;
    Ok(Json(tool))
}

/// Patch body: notes only.
#[derive(Debug, Default, Deserialize)]
pub struct PatchBody {
    /// Replacement notes (null clears them)
    #[serde(default)]
    pub notes: Option<String>,
}

/// `PATCH /api/tools/hardcoded/{id}`
pub async fn patch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>> {
    let body: PatchBody = parse_json(&body, "Invalid JSON")?;
    queries::update_hardcoded(&state.db, &id, body.notes.as_deref()).await?;
    Ok(Json(json!({ "id": id, "notes": body.notes })))
}

/// `DELETE /api/tools/hardcoded/{id}`
///
/// Removes the profile only; the registry entry stays.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    queries::delete_hardcoded(&state.db, &id).await?;
    Ok(Json(json!({ "ok": true })))
}
