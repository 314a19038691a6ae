//! n8n tool profile creation. Admin-only.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Deserialize;

use super::parse_json_lenient;
use crate::auth::CurrentUser;
use crate::router::AppState;
use crate::store::models::ToolType;
use crate::store::queries::{self, N8nProfile};
use crate::{Error, Result};

/// Create body for an n8n profile.
#[derive(Debug, Default, Deserialize)]
pub struct CreateBody {
    /// Registry entry to attach the profile to
    #[serde(default)]
    pub id: Option<String>,
    /// Webhook URL
    #[serde(default)]
    pub external_url: Option<String>,
    /// Security key reference
    #[serde(default)]
    pub security_key_id: Option<String>,
    /// Return webhook output verbatim
    #[serde(default)]
    pub return_direct: bool,
    /// Run isolated
    #[serde(default)]
    pub is_isolated: bool,
    /// Stream when single tool
    #[serde(default)]
    pub stream_if_single_tool: bool,
    /// Emit a flash answer
    #[serde(default)]
    pub flash_answer_needed: bool,
    /// Webhook timeout
    #[serde(default)]
    pub timeout_seconds: Option<i64>,
}

/// `POST /api/tools/n8n`
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Response> {
    if !queries::is_admin(&state.db, &user.id).await? {
        return Err(Error::Forbidden);
    }

    let body: CreateBody = parse_json_lenient(&body);
    let (Some(id), Some(external_url), Some(security_key_id)) = (
        body.id.filter(|v| !v.is_empty()),
        body.external_url.filter(|v| !v.is_empty()),
        body.security_key_id.filter(|v| !v.is_empty()),
    ) else {
        return Err(Error::BadRequest("missing_fields"));
    };

    let registry = queries::get_registry(&state.db, &id)
        .await?
        .ok_or(Error::NotFound("registry_not_found"))?;
    if ToolType::parse(&registry.tool_type) != Some(ToolType::N8n) {
        return Err(Error::BadRequest("type_mismatch"));
    }

    let profile = N8nProfile {
        external_url,
        security_key_id,
        return_direct: body.return_direct,
        is_isolated: body.is_isolated,
        stream_if_single_tool: body.stream_if_single_tool,
        flash_answer_needed: body.flash_answer_needed,
        timeout_seconds: body.timeout_seconds.unwrap_or(30),
    };
    let created = queries::create_n8n(&state.db, &id, &profile).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}
