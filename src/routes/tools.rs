//! `POST /api/tools` — unified create.
//!
//! Creates the registry entry and its type-specific profile in one
//! transaction. Non-admins are demoted to HARD_CODED before the profile
//! is validated, so only admins ever reach the N8N/DUST branches.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{non_empty, parse_json};
use crate::auth::CurrentUser;
use crate::router::AppState;
use crate::store::models::ToolType;
use crate::store::queries::{self, DustProfile, N8nProfile, NewRegistry, ProfileSpec};
use crate::{Error, Result};

/// Unified create body: registry fields plus a free-form profile object.
#[derive(Debug, Default, Deserialize)]
pub struct CreateToolBody {
    /// Unique machine-facing call name
    #[serde(default)]
    pub explicit_call_name: Option<String>,
    /// Human-facing label
    #[serde(default)]
    pub readable_name: Option<String>,
    /// Entry kind (defaults to HARD_CODED)
    #[serde(default)]
    pub tool_type: Option<String>,
    /// Tags to attach
    #[serde(default)]
    pub tag_ids: Option<Vec<String>>,
    /// Type-specific profile fields
    #[serde(default)]
    pub profile: Option<Value>,
}

/// `POST /api/tools`
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Response> {
    let body: CreateToolBody = parse_json(&body, "invalid_json")?;

    let Some(explicit_call_name) = non_empty(body.explicit_call_name) else {
        return Err(Error::BadRequest("missing_fields"));
    };
    let Some(readable_name) = non_empty(body.readable_name) else {
        return Err(Error::BadRequest("missing_fields"));
    };

    let admin = queries::is_admin(&state.db, &user.id).await?;
    let mut tool_type = body
        .tool_type
        .as_deref()
        .and_then(ToolType::parse)
        .unwrap_or(ToolType::HardCoded);
    if !admin {
        tool_type = ToolType::HardCoded;
    }

    let profile = body.profile.unwrap_or_else(|| json!({}));
    let spec = build_profile(tool_type, &profile)?;

    let new = NewRegistry {
        explicit_call_name,
        readable_name,
        description: None,
        tool_type,
    };
    let tag_ids = body.tag_ids.unwrap_or_default();

    let id = queries::create_tool_with_profile(&state.db, &new, &tag_ids, &spec).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "toolType": tool_type })),
    )
        .into_response())
}

/// Validate and extract the per-type profile fields.
fn build_profile(tool_type: ToolType, profile: &Value) -> Result<ProfileSpec> {
    match tool_type {
        ToolType::HardCoded => Ok(ProfileSpec::Hardcoded {
            notes: profile_str(profile, "notes"),
        }),
        ToolType::N8n => {
            let Some(external_url) = profile_str(profile, "external_url") else {
                return Err(Error::BadRequest("missing_profile_fields"));
            };
            let Some(security_key_id) = profile_str(profile, "security_key_id") else {
                return Err(Error::BadRequest("missing_profile_fields"));
            };
            Ok(ProfileSpec::N8n(N8nProfile {
                external_url,
                security_key_id,
                return_direct: profile_truthy(profile, "return_direct"),
                is_isolated: profile_truthy(profile, "is_isolated"),
                stream_if_single_tool: profile_truthy(profile, "stream_if_single_tool"),
                flash_answer_needed: profile_truthy(profile, "flash_answer_needed"),
                timeout_seconds: profile_i64(profile, "timeout_seconds", 30),
            }))
        }
        ToolType::Dust => {
            let Some(dust_workspace_sid) = profile_str(profile, "dust_workspace_sid") else {
                return Err(Error::BadRequest("missing_profile_fields"));
            };
            let Some(dust_agent_sid) = profile_str(profile, "dust_agent_sid") else {
                return Err(Error::BadRequest("missing_profile_fields"));
            };
            let Some(security_key_id) = profile_str(profile, "security_key_id") else {
                return Err(Error::BadRequest("missing_profile_fields"));
            };
            Ok(ProfileSpec::Dust(DustProfile {
                dust_workspace_sid,
                dust_agent_sid,
                security_key_id,
                return_direct: profile_truthy(profile, "return_direct"),
                is_isolated: profile_truthy(profile, "is_isolated"),
                stream_if_single_tool: profile_truthy(profile, "stream_if_single_tool"),
                api_timeout_seconds: profile_i64(profile, "api_timeout_seconds", 30),
                message_events_timeout_seconds: profile_i64(
                    profile,
                    "message_events_timeout_seconds",
                    180,
                ),
                conversation_events_timeout_seconds: profile_i64(
                    profile,
                    "conversation_events_timeout_seconds",
                    30,
                ),
            }))
        }
    }
}

fn profile_str(profile: &Value, key: &str) -> Option<String> {
    profile
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

fn profile_truthy(profile: &Value, key: &str) -> bool {
    match profile.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

fn profile_i64(profile: &Value, key: &str, default: i64) -> i64 {
    profile
        .get(key)
        .and_then(Value::as_i64)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn n8n_profile_requires_url_and_key() {
        let incomplete = json!({ "external_url": "https://n8n.example.com/hook" });
        assert!(matches!(
            build_profile(ToolType::N8n, &incomplete),
            Err(Error::BadRequest("missing_profile_fields"))
        ));

        let complete = json!({
            "external_url": "https://n8n.example.com/hook",
            "security_key_id": "key-1",
            "return_direct": true,
        });
        let spec = build_profile(ToolType::N8n, &complete).unwrap();
        match spec {
            ProfileSpec::N8n(profile) => {
                assert!(profile.return_direct);
                assert_eq!(profile.timeout_seconds, 30);
            }
            _ => panic!("expected n8n profile"),
        }
    }

    #[test]
    fn dust_profile_requires_all_sids() {
        let incomplete = json!({
            "dust_workspace_sid": "ws",
            "security_key_id": "key-1",
        });
        assert!(build_profile(ToolType::Dust, &incomplete).is_err());

        let complete = json!({
            "dust_workspace_sid": "ws",
            "dust_agent_sid": "agent",
            "security_key_id": "key-1",
            "message_events_timeout_seconds": 60,
        });
        match build_profile(ToolType::Dust, &complete).unwrap() {
            ProfileSpec::Dust(profile) => {
                assert_eq!(profile.message_events_timeout_seconds, 60);
                assert_eq!(profile.conversation_events_timeout_seconds, 30);
            }
            _ => panic!("expected dust profile"),
        }
    }

    #[test]
    fn hardcoded_profile_accepts_anything() {
        let spec = build_profile(ToolType::HardCoded, &json!({})).unwrap();
        assert!(matches!(spec, ProfileSpec::Hardcoded { notes: None }));

        let spec = build_profile(ToolType::HardCoded, &json!({ "notes": "internal" })).unwrap();
        assert!(matches!(
            spec,
            ProfileSpec::Hardcoded { notes: Some(ref n) } if n == "internal"
        ));
    }

    #[test]
    fn truthiness_follows_loose_javascript_rules() {
        let profile = json!({
            "a": true, "b": false, "c": 0, "d": 1, "e": "", "f": "x", "g": null,
        });
        assert!(profile_truthy(&profile, "a"));
        assert!(!profile_truthy(&profile, "b"));
        assert!(!profile_truthy(&profile, "c"));
        assert!(profile_truthy(&profile, "d"));
        assert!(!profile_truthy(&profile, "e"));
        assert!(profile_truthy(&profile, "f"));
        assert!(!profile_truthy(&profile, "g"));
        assert!(!profile_truthy(&profile, "missing"));
    }
}
