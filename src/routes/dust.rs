//! Dust tool profile creation. Admin-only.

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
use crate::store::queries::{self, DustProfile};
use crate::{Error, Result};

/// Create body for a Dust profile.
#[derive(Debug, Default, Deserialize)]
pub struct CreateBody {
    /// Registry entry to attach the profile to
    #[serde(default)]
    pub id: Option<String>,
    /// Dust workspace sid
    #[serde(default)]
    pub dust_workspace_sid: Option<String>,
    /// Dust agent sid
    #[serde(default)]
    pub dust_agent_sid: Option<String>,
    /// Security key reference
    #[serde(default)]
    pub security_key_id: Option<String>,
    /// Return agent output verbatim
    #[serde(default)]
    pub return_direct: bool,
    /// Run isolated
    #[serde(default)]
    pub is_isolated: bool,
    /// Stream when single tool
    #[serde(default)]
    pub stream_if_single_tool: bool,
    /// Dust API timeout
    #[serde(default)]
    pub api_timeout_seconds: Option<i64>,
    /// Message events timeout
    #[serde(default)]
    pub message_events_timeout_seconds: Option<i64>,
    /// Conversation events timeout
    #[serde(default)]
    pub conversation_events_timeout_seconds: Option<i64>,
}

/// `POST /api/tools/dust`
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Response> {
    if !queries::is_admin(&state.db, &user.id).await? {
        return Err(Error::Forbidden);
    }

    let body: CreateBody = parse_json_lenient(&body);
    let (Some(id), Some(dust_workspace_sid), Some(dust_agent_sid), Some(security_key_id)) = (
        body.id.filter(|v| !v.is_empty()),
        body.dust_workspace_sid.filter(|v| !v.is_empty()),
        body.dust_agent_sid.filter(|v| !v.is_empty()),
        body.security_key_id.filter(|v| !v.is_empty()),
    ) else {
        return Err(Error::BadRequest("missing_fields"));
    };

    let registry = queries::get_registry(&state.db, &id)
        .await?
        .ok_or(Error::NotFound("registry_not_found"))?;
    if ToolType::parse(&registry.tool_type) != Some(ToolType::Dust) {
        return Err(Error::BadRequest("type_mismatch"));
    }

    let profile = DustProfile {
        dust_workspace_sid,
        dust_agent_sid,
        security_key_id,
        return_direct: body.return_direct,
        is_isolated: body.is_isolated,
        stream_if_single_tool: body.stream_if_single_tool,
        api_timeout_seconds: body.api_timeout_seconds.unwrap_or(30),
        message_events_timeout_seconds: body.message_events_timeout_seconds.unwrap_or(180),
        conversation_events_timeout_seconds: body
            .conversation_events_timeout_seconds
            .unwrap_or(30),
    };
    let created = queries::create_dust(&state.db, &id, &profile).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}
