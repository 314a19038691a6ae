//! Store row types and the tool-type discriminator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tool entry kind in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolType {
    /// Built-in tool implemented in application code
    #[serde(rename = "HARD_CODED")]
    HardCoded,
    /// Tool backed by an n8n webhook
    #[serde(rename = "N8N")]
    N8n,
    /// Tool backed by a Dust agent
    #[serde(rename = "DUST")]
    Dust,
}

impl ToolType {
    /// Stable string stored in the database and sent on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HardCoded => "HARD_CODED",
            Self::N8n => "N8N",
            Self::Dust => "DUST",
        }
    }

    /// Parse the wire/database representation.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "HARD_CODED" => Some(Self::HardCoded),
            "N8N" => Some(Self::N8n),
            "DUST" => Some(Self::Dust),
            _ => None,
        }
    }
}

impl std::fmt::Display for ToolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tag attachable to registry entries.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Tag {
    /// Row id
    pub id: String,
    /// Unique tag name
    pub name: String,
}

/// A security key referenced by n8n/dust tool profiles.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SecurityKey {
    /// Row id
    pub id: String,
    /// Unique system name
    pub system_name: String,
    /// Free-form description
    pub description: Option<String>,
    /// Token-derived id of the creator, when known
    pub created_by_user_id: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// A tools-registry row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegistryRow {
    /// Row id
    pub id: String,
    /// Unique machine-facing call name
    pub explicit_call_name: String,
    /// Human-facing label
    pub readable_name: String,
    /// Free-form description
    pub description: Option<String>,
    /// Discriminator, one of the [`ToolType`] strings
    pub tool_type: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// Registry fields nested inside profile responses.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySummary {
    /// Registry row id
    pub id: String,
    /// Unique machine-facing call name
    pub explicit_call_name: String,
    /// Human-facing label
    pub readable_name: String,
    /// Discriminator string
    pub tool_type: String,
}

/// A hardcoded tool profile joined with its registry entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HardcodedTool {
    /// Same id as the registry row
    pub id: String,
    /// Operator notes
    pub notes: Option<String>,
    /// The owning registry entry
    pub registry: RegistrySummary,
}

/// An n8n-webhook tool profile.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct N8nTool {
    /// Same id as the registry row
    pub id: String,
    /// Webhook URL invoked by the agent backend
    pub external_url: String,
    /// Security key used when calling the webhook
    pub security_key_id: String,
    /// Return the webhook response to the user verbatim
    pub return_direct: bool,
    /// Run isolated from other tools
    pub is_isolated: bool,
    /// Stream when this is the only tool in the turn
    pub stream_if_single_tool: bool,
    /// Emit a flash answer while the webhook runs
    pub flash_answer_needed: bool,
    /// Webhook timeout
    pub timeout_seconds: i64,
}

/// A Dust-agent tool profile.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DustTool {
    /// Same id as the registry row
    pub id: String,
    /// Dust workspace sid
    pub dust_workspace_sid: String,
    /// Dust agent sid
    pub dust_agent_sid: String,
    /// Security key used when calling Dust
    pub security_key_id: String,
    /// Return the agent response to the user verbatim
    pub return_direct: bool,
    /// Run isolated from other tools
    pub is_isolated: bool,
    /// Stream when this is the only tool in the turn
    pub stream_if_single_tool: bool,
    /// Dust API timeout
    pub api_timeout_seconds: i64,
    /// Message events stream timeout
    pub message_events_timeout_seconds: i64,
    /// Conversation events stream timeout
    pub conversation_events_timeout_seconds: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_type_round_trips_wire_strings() {
        for (ty, s) in [
            (ToolType::HardCoded, "HARD_CODED"),
            (ToolType::N8n, "N8N"),
            (ToolType::Dust, "DUST"),
        ] {
            assert_eq!(ty.as_str(), s);
            assert_eq!(ToolType::parse(s), Some(ty));
        }
        assert_eq!(ToolType::parse("WEBHOOK"), None);
    }

    #[test]
    fn tool_type_serde_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&ToolType::HardCoded).unwrap(),
            "\"HARD_CODED\""
        );
        let parsed: ToolType = serde_json::from_str("\"DUST\"").unwrap();
        assert_eq!(parsed, ToolType::Dust);
    }
}
