//! Store queries
//!
//! Plain async functions over the injected pool. Role lookups are
//! read-only and fresh per privileged action; nothing is cached. Mutations map
//! unique-constraint violations to the route-level conflict codes; other
//! store failures keep their operation-specific `*_failed` code and log
//! the underlying error server-side.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

use super::models::{
    DustTool, HardcodedTool, N8nTool, RegistryRow, RegistrySummary, SecurityKey, Tag, ToolType,
};
use crate::{Error, Result};

/// New registry entry parameters.
#[derive(Debug, Clone)]
pub struct NewRegistry {
    /// Unique machine-facing call name
    pub explicit_call_name: String,
    /// Human-facing label
    pub readable_name: String,
    /// Free-form description
    pub description: Option<String>,
    /// Entry kind
    pub tool_type: ToolType,
}

/// n8n profile parameters.
#[derive(Debug, Clone)]
pub struct N8nProfile {
    /// Webhook URL
    pub external_url: String,
    /// Security key reference
    pub security_key_id: String,
    /// Return webhook output verbatim
    pub return_direct: bool,
    /// Run isolated
    pub is_isolated: bool,
    /// Stream when single tool
    pub stream_if_single_tool: bool,
    /// Emit a flash answer
    pub flash_answer_needed: bool,
    /// Webhook timeout
    pub timeout_seconds: i64,
}

/// Dust profile parameters.
#[derive(Debug, Clone)]
pub struct DustProfile {
    /// Dust workspace sid
    pub dust_workspace_sid: String,
    /// Dust agent sid
    pub dust_agent_sid: String,
    /// Security key reference
    pub security_key_id: String,
    /// Return agent output verbatim
    pub return_direct: bool,
    /// Run isolated
    pub is_isolated: bool,
    /// Stream when single tool
    pub stream_if_single_tool: bool,
    /// Dust API timeout
    pub api_timeout_seconds: i64,
    /// Message events timeout
    pub message_events_timeout_seconds: i64,
    /// Conversation events timeout
    pub conversation_events_timeout_seconds: i64,
}

/// Profile payload for the unified create.
#[derive(Debug, Clone)]
pub enum ProfileSpec {
    /// Hardcoded profile (notes only)
    Hardcoded {
        /// Operator notes
        notes: Option<String>,
    },
    /// n8n webhook profile
    N8n(N8nProfile),
    /// Dust agent profile
    Dust(DustProfile),
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Map a mutation error: unique violations become the given conflict
/// code, everything else keeps the operation's `*_failed` code.
fn mutation_err(
    err: sqlx::Error,
    conflict_code: Option<&'static str>,
    failed_code: &'static str,
) -> Error {
    if let Some(code) = conflict_code {
        if is_unique_violation(&err) {
            return Error::Conflict(code);
        }
    }
    warn!(error = %err, code = failed_code, "store mutation failed");
    Error::Internal(failed_code)
}

// ── Roles ─────────────────────────────────────────────────────────────────

/// Whether a role-membership row associates `user_id` with ADMIN.
///
/// Existence check, not a count; store errors propagate as 500s.
pub async fn is_admin(pool: &SqlitePool, user_id: &str) -> Result<bool> {
    let found: i64 = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM user_roles ur \
         JOIN roles r ON r.id = ur.role_id \
         WHERE ur.user_id = ?1 AND r.name = 'ADMIN')",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(found != 0)
}

/// Role names recorded for a user. An empty result means the caller
/// should treat the user as plain USER.
pub async fn role_names_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<String>> {
    let names = sqlx::query_scalar(
        "SELECT r.name FROM user_roles ur \
         JOIN roles r ON r.id = ur.role_id \
         WHERE ur.user_id = ?1 ORDER BY r.name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(names)
}

// ── Tags ──────────────────────────────────────────────────────────────────

/// All tags, alphabetically.
pub async fn list_tags(pool: &SqlitePool) -> Result<Vec<Tag>> {
    let tags = sqlx::query_as("SELECT id, name FROM tags ORDER BY name ASC")
        .fetch_all(pool)
        .await?;
    Ok(tags)
}

// ── Security keys ─────────────────────────────────────────────────────────

/// All security keys, newest first.
pub async fn list_security_keys(pool: &SqlitePool) -> Result<Vec<SecurityKey>> {
    let keys = sqlx::query_as(
        "SELECT id, system_name, description, created_by_user_id, created_at, updated_at \
         FROM security_keys ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(keys)
}

/// Create a security key. Duplicate `system_name` → 409.
pub async fn create_security_key(
    pool: &SqlitePool,
    system_name: &str,
    description: Option<&str>,
    created_by_user_id: &str,
) -> Result<SecurityKey> {
    let key = SecurityKey {
        id: Uuid::new_v4().to_string(),
        system_name: system_name.to_string(),
        description: description.map(ToString::to_string),
        created_by_user_id: Some(created_by_user_id.to_string()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    sqlx::query(
        "INSERT INTO security_keys (id, system_name, description, created_by_user_id, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(&key.id)
    .bind(&key.system_name)
    .bind(&key.description)
    .bind(&key.created_by_user_id)
    .bind(key.created_at)
    .bind(key.updated_at)
    .execute(pool)
    .await
    .map_err(|e| mutation_err(e, Some("system_name_conflict"), "create_failed"))?;
    Ok(key)
}

/// Replace a key's description. Missing id → `update_failed` (500).
pub async fn update_security_key(
    pool: &SqlitePool,
    id: &str,
    description: Option<&str>,
) -> Result<SecurityKey> {
    let result = sqlx::query(
        "UPDATE security_keys SET description = ?2, updated_at = ?3 WHERE id = ?1",
    )
    .bind(id)
    .bind(description)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| mutation_err(e, None, "update_failed"))?;
    if result.rows_affected() == 0 {
        return Err(Error::Internal("update_failed"));
    }

    let key = sqlx::query_as(
        "SELECT id, system_name, description, created_by_user_id, created_at, updated_at \
         FROM security_keys WHERE id = ?1",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(key)
}

/// Delete a key. Missing id → `delete_failed` (500).
pub async fn delete_security_key(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM security_keys WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| mutation_err(e, None, "delete_failed"))?;
    if result.rows_affected() == 0 {
        return Err(Error::Internal("delete_failed"));
    }
    Ok(())
}

// ── Tools registry ────────────────────────────────────────────────────────

/// Registry entries (newest first) with their tags, optionally filtered
/// by tool type and/or tag name.
pub async fn list_registry(
    pool: &SqlitePool,
    tool_type: Option<ToolType>,
    tag_name: Option<&str>,
) -> Result<Vec<(RegistryRow, Vec<Tag>)>> {
    let rows: Vec<RegistryRow> = sqlx::query_as(
        "SELECT id, explicit_call_name, readable_name, description, tool_type, created_at, updated_at \
         FROM tools_registry \
         WHERE (?1 IS NULL OR tool_type = ?1) \
           AND (?2 IS NULL OR EXISTS ( \
                SELECT 1 FROM tool_tags tt JOIN tags t ON t.id = tt.tag_id \
                WHERE tt.tool_id = tools_registry.id AND t.name = ?2)) \
         ORDER BY created_at DESC",
    )
    .bind(tool_type.map(ToolType::as_str))
    .bind(tag_name)
    .fetch_all(pool)
    .await?;

    let links: Vec<(String, String, String)> = sqlx::query_as(
        "SELECT tt.tool_id, t.id, t.name FROM tool_tags tt \
         JOIN tags t ON t.id = tt.tag_id ORDER BY t.name ASC",
    )
    .fetch_all(pool)
    .await?;

    let entries = rows
        .into_iter()
        .map(|row| {
            let tags = links
                .iter()
                .filter(|(tool_id, _, _)| *tool_id == row.id)
                .map(|(_, id, name)| Tag {
                    id: id.clone(),
                    name: name.clone(),
                })
                .collect();
            (row, tags)
        })
        .collect();
    Ok(entries)
}

/// Fetch one registry entry.
pub async fn get_registry(pool: &SqlitePool, id: &str) -> Result<Option<RegistryRow>> {
    let row = sqlx::query_as(
        "SELECT id, explicit_call_name, readable_name, description, tool_type, created_at, updated_at \
         FROM tools_registry WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Create a registry entry with optional tag links.
///
/// Tag ids are validated first (`invalid_tag_ids` → 400); a duplicate
/// call name maps to `explicit_call_name_conflict` (409).
pub async fn create_registry(
    pool: &SqlitePool,
    new: &NewRegistry,
    tag_ids: &[String],
) -> Result<String> {
    let mut tx = pool.begin().await?;
    validate_tag_ids(&mut tx, tag_ids).await?;
    let id = insert_registry(&mut tx, new, tag_ids).await?;
    tx.commit().await?;
    Ok(id)
}

/// Rename a registry entry (call name and/or label). `tool_type` changes
/// are rejected at the route layer.
pub async fn update_registry_names(
    pool: &SqlitePool,
    id: &str,
    explicit_call_name: Option<&str>,
    readable_name: Option<&str>,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE tools_registry SET \
            explicit_call_name = COALESCE(?2, explicit_call_name), \
            readable_name = COALESCE(?3, readable_name), \
            updated_at = ?4 \
         WHERE id = ?1",
    )
    .bind(id)
    .bind(explicit_call_name)
    .bind(readable_name)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| mutation_err(e, Some("explicit_call_name_conflict"), "update_failed"))?;
    if result.rows_affected() == 0 {
        return Err(Error::Internal("update_failed"));
    }
    Ok(())
}

/// Delete a registry entry; profiles and tag links cascade.
pub async fn delete_registry(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM tools_registry WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| mutation_err(e, None, "delete_failed"))?;
    if result.rows_affected() == 0 {
        return Err(Error::Internal("delete_failed"));
    }
    Ok(())
}

// ── Hardcoded tool profiles ───────────────────────────────────────────────

type HardcodedJoinRow = (String, Option<String>, String, String, String, String);

fn hardcoded_from_join(row: HardcodedJoinRow) -> HardcodedTool {
    let (id, notes, reg_id, explicit_call_name, readable_name, tool_type) = row;
    HardcodedTool {
        id,
        notes,
        registry: RegistrySummary {
            id: reg_id,
            explicit_call_name,
            readable_name,
            tool_type,
        },
    }
}

/// Hardcoded profiles joined with their registry entries, newest first.
pub async fn list_hardcoded(pool: &SqlitePool) -> Result<Vec<HardcodedTool>> {
    let rows: Vec<HardcodedJoinRow> = sqlx::query_as(
        "SELECT h.id, h.notes, r.id, r.explicit_call_name, r.readable_name, r.tool_type \
         FROM hardcoded_tools h JOIN tools_registry r ON r.id = h.id \
         ORDER BY r.created_at DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(hardcoded_from_join).collect())
}

/// Fetch one hardcoded profile with its registry entry.
pub async fn get_hardcoded(pool: &SqlitePool, id: &str) -> Result<Option<HardcodedTool>> {
    let row: Option<HardcodedJoinRow> = sqlx::query_as(
        "SELECT h.id, h.notes, r.id, r.explicit_call_name, r.readable_name, r.tool_type \
         FROM hardcoded_tools h JOIN tools_registry r ON r.id = h.id \
         WHERE h.id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(hardcoded_from_join))
}

/// Attach a hardcoded profile to an existing registry entry.
pub async fn create_hardcoded(pool: &SqlitePool, id: &str, notes: Option<&str>) -> Result<()> {
    sqlx::query("INSERT INTO hardcoded_tools (id, notes) VALUES (?1, ?2)")
        .bind(id)
        .bind(notes)
        .execute(pool)
        .await
        .map_err(|e| mutation_err(e, None, "create_failed"))?;
    Ok(())
}

/// Replace a profile's notes. Missing id → `update_failed` (500).
pub async fn update_hardcoded(pool: &SqlitePool, id: &str, notes: Option<&str>) -> Result<()> {
    let result = sqlx::query("UPDATE hardcoded_tools SET notes = ?2 WHERE id = ?1")
        .bind(id)
        .bind(notes)
        .execute(pool)
        .await
        .map_err(|e| mutation_err(e, None, "update_failed"))?;
    if result.rows_affected() == 0 {
        return Err(Error::Internal("update_failed"));
    }
    Ok(())
}

/// Delete a profile without touching its registry entry.
pub async fn delete_hardcoded(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM hardcoded_tools WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| mutation_err(e, None, "delete_failed"))?;
    if result.rows_affected() == 0 {
        return Err(Error::Internal("delete_failed"));
    }
    Ok(())
}

// ── n8n / dust tool profiles ──────────────────────────────────────────────

/// Attach an n8n profile to an existing registry entry.
pub async fn create_n8n(pool: &SqlitePool, id: &str, profile: &N8nProfile) -> Result<N8nTool> {
    let mut tx = pool.begin().await?;
    insert_n8n(&mut tx, id, profile).await?;
    tx.commit().await?;
    Ok(n8n_tool(id, profile))
}

/// Attach a Dust profile to an existing registry entry.
pub async fn create_dust(pool: &SqlitePool, id: &str, profile: &DustProfile) -> Result<DustTool> {
    let mut tx = pool.begin().await?;
    insert_dust(&mut tx, id, profile).await?;
    tx.commit().await?;
    Ok(dust_tool(id, profile))
}

// ── Unified create ────────────────────────────────────────────────────────

/// Create a registry entry and its profile in one transaction.
pub async fn create_tool_with_profile(
    pool: &SqlitePool,
    new: &NewRegistry,
    tag_ids: &[String],
    profile: &ProfileSpec,
) -> Result<String> {
    let mut tx = pool.begin().await?;
    validate_tag_ids(&mut tx, tag_ids).await?;
    let id = insert_registry(&mut tx, new, tag_ids).await?;

    match profile {
        ProfileSpec::Hardcoded { notes } => {
            sqlx::query("INSERT INTO hardcoded_tools (id, notes) VALUES (?1, ?2)")
                .bind(&id)
                .bind(notes)
                .execute(&mut *tx)
                .await
                .map_err(|e| mutation_err(e, None, "create_failed"))?;
        }
        ProfileSpec::N8n(n8n) => insert_n8n(&mut tx, &id, n8n).await?,
        ProfileSpec::Dust(dust) => insert_dust(&mut tx, &id, dust).await?,
    }

    tx.commit().await?;
    Ok(id)
}

// ── Shared insert helpers ─────────────────────────────────────────────────

async fn validate_tag_ids(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    tag_ids: &[String],
) -> Result<()> {
    for tag_id in tag_ids {
        let found: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tags WHERE id = ?1)")
            .bind(tag_id)
            .fetch_one(&mut **tx)
            .await?;
        if found == 0 {
            return Err(Error::BadRequest("invalid_tag_ids"));
        }
    }
    Ok(())
}

async fn insert_registry(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    new: &NewRegistry,
    tag_ids: &[String],
) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO tools_registry (id, explicit_call_name, readable_name, description, tool_type, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
    )
    .bind(&id)
    .bind(&new.explicit_call_name)
    .bind(&new.readable_name)
    .bind(&new.description)
    .bind(new.tool_type.as_str())
    .bind(now)
    .execute(&mut **tx)
    .await
    .map_err(|e| mutation_err(e, Some("explicit_call_name_conflict"), "create_failed"))?;

    for tag_id in tag_ids {
        sqlx::query("INSERT INTO tool_tags (tool_id, tag_id) VALUES (?1, ?2)")
            .bind(&id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| mutation_err(e, None, "create_failed"))?;
    }

    Ok(id)
}

async fn insert_n8n(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    id: &str,
    profile: &N8nProfile,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO n8n_tools (id, external_url, security_key_id, return_direct, is_isolated, \
            stream_if_single_tool, flash_answer_needed, timeout_seconds) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(id)
    .bind(&profile.external_url)
    .bind(&profile.security_key_id)
    .bind(profile.return_direct)
    .bind(profile.is_isolated)
    .bind(profile.stream_if_single_tool)
    .bind(profile.flash_answer_needed)
    .bind(profile.timeout_seconds)
    .execute(&mut **tx)
    .await
    .map_err(|e| mutation_err(e, None, "create_failed"))?;
    Ok(())
}

async fn insert_dust(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    id: &str,
    profile: &DustProfile,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO dust_tools (id, dust_workspace_sid, dust_agent_sid, security_key_id, \
            return_direct, is_isolated, stream_if_single_tool, api_timeout_seconds, \
            message_events_timeout_seconds, conversation_events_timeout_seconds) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )
    .bind(id)
    .bind(&profile.dust_workspace_sid)
    .bind(&profile.dust_agent_sid)
    .bind(&profile.security_key_id)
    .bind(profile.return_direct)
    .bind(profile.is_isolated)
    .bind(profile.stream_if_single_tool)
    .bind(profile.api_timeout_seconds)
    .bind(profile.message_events_timeout_seconds)
    .bind(profile.conversation_events_timeout_seconds)
    .execute(&mut **tx)
    .await
    .map_err(|e| mutation_err(e, None, "create_failed"))?;
    Ok(())
}

fn n8n_tool(id: &str, profile: &N8nProfile) -> N8nTool {
    N8nTool {
        id: id.to_string(),
        external_url: profile.external_url.clone(),
        security_key_id: profile.security_key_id.clone(),
        return_direct: profile.return_direct,
        is_isolated: profile.is_isolated,
        stream_if_single_tool: profile.stream_if_single_tool,
        flash_answer_needed: profile.flash_answer_needed,
        timeout_seconds: profile.timeout_seconds,
    }
}

fn dust_tool(id: &str, profile: &DustProfile) -> DustTool {
    DustTool {
        id: id.to_string(),
        dust_workspace_sid: profile.dust_workspace_sid.clone(),
        dust_agent_sid: profile.dust_agent_sid.clone(),
        security_key_id: profile.security_key_id.clone(),
        return_direct: profile.return_direct,
        is_isolated: profile.is_isolated,
        stream_if_single_tool: profile.stream_if_single_tool,
        api_timeout_seconds: profile.api_timeout_seconds,
        message_events_timeout_seconds: profile.message_events_timeout_seconds,
        conversation_events_timeout_seconds: profile.conversation_events_timeout_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        // One connection so the in-memory database is shared
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::store::ensure_schema(&pool).await.unwrap();
        pool
    }

    async fn insert_tag(pool: &SqlitePool, name: &str) -> String {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO tags (id, name) VALUES (?1, ?2)")
            .bind(&id)
            .bind(name)
            .execute(pool)
            .await
            .unwrap();
        id
    }

    fn registry(name: &str, tool_type: ToolType) -> NewRegistry {
        NewRegistry {
            explicit_call_name: name.to_string(),
            readable_name: format!("{name} label"),
            description: None,
            tool_type,
        }
    }

    #[tokio::test]
    async fn seed_grants_admin_to_bootstrap_user() {
        let pool = test_pool().await;
        let settings = Settings {
            admin_user_id: Some("boss".to_string()),
            ..Settings::default()
        };
        crate::store::seed(&pool, &settings).await.unwrap();
        // Seeding twice must not fail on the unique constraints
        crate::store::seed(&pool, &settings).await.unwrap();

        assert!(is_admin(&pool, "boss").await.unwrap());
        assert!(!is_admin(&pool, "someone-else").await.unwrap());
        assert_eq!(
            role_names_for_user(&pool, "boss").await.unwrap(),
            vec!["ADMIN".to_string()]
        );
        assert!(role_names_for_user(&pool, "someone-else")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn security_key_crud_and_conflict() {
        let pool = test_pool().await;

        let key = create_security_key(&pool, "slack-bot", Some("Slack token"), "u1")
            .await
            .unwrap();
        assert_eq!(key.system_name, "slack-bot");

        let err = create_security_key(&pool, "slack-bot", None, "u2")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict("system_name_conflict")));

        let updated = update_security_key(&pool, &key.id, Some("rotated"))
            .await
            .unwrap();
        assert_eq!(updated.description.as_deref(), Some("rotated"));

        delete_security_key(&pool, &key.id).await.unwrap();
        assert!(list_security_keys(&pool).await.unwrap().is_empty());

        let err = delete_security_key(&pool, &key.id).await.unwrap_err();
        assert!(matches!(err, Error::Internal("delete_failed")));
    }

    #[tokio::test]
    async fn registry_create_list_and_filters() {
        let pool = test_pool().await;
        let tag_id = insert_tag(&pool, "search").await;

        let hard = create_registry(&pool, &registry("lookup", ToolType::HardCoded), &[tag_id])
            .await
            .unwrap();
        create_registry(&pool, &registry("webhook", ToolType::N8n), &[])
            .await
            .unwrap();

        let all = list_registry(&pool, None, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let hard_only = list_registry(&pool, Some(ToolType::HardCoded), None)
            .await
            .unwrap();
        assert_eq!(hard_only.len(), 1);
        assert_eq!(hard_only[0].0.id, hard);
        assert_eq!(hard_only[0].1[0].name, "search");

        let tagged = list_registry(&pool, None, Some("search")).await.unwrap();
        assert_eq!(tagged.len(), 1);
        assert!(list_registry(&pool, None, Some("missing"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn duplicate_call_name_conflicts() {
        let pool = test_pool().await;
        create_registry(&pool, &registry("dup", ToolType::HardCoded), &[])
            .await
            .unwrap();
        let err = create_registry(&pool, &registry("dup", ToolType::HardCoded), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict("explicit_call_name_conflict")));
    }

    #[tokio::test]
    async fn unknown_tag_id_rejects_create() {
        let pool = test_pool().await;
        let err = create_registry(
            &pool,
            &registry("tool", ToolType::HardCoded),
            &["no-such-tag".to_string()],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::BadRequest("invalid_tag_ids")));
        // Nothing committed
        assert!(list_registry(&pool, None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rename_rejects_duplicates_and_missing_rows() {
        let pool = test_pool().await;
        let a = create_registry(&pool, &registry("alpha", ToolType::HardCoded), &[])
            .await
            .unwrap();
        create_registry(&pool, &registry("beta", ToolType::HardCoded), &[])
            .await
            .unwrap();

        update_registry_names(&pool, &a, None, Some("Alpha tool"))
            .await
            .unwrap();
        let row = get_registry(&pool, &a).await.unwrap().unwrap();
        assert_eq!(row.readable_name, "Alpha tool");
        assert_eq!(row.explicit_call_name, "alpha");

        let err = update_registry_names(&pool, &a, Some("beta"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict("explicit_call_name_conflict")));

        let err = update_registry_names(&pool, "missing", Some("x"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Internal("update_failed")));
    }

    #[tokio::test]
    async fn registry_delete_cascades_to_profiles() {
        let pool = test_pool().await;
        let id = create_registry(&pool, &registry("hc", ToolType::HardCoded), &[])
            .await
            .unwrap();
        create_hardcoded(&pool, &id, Some("internal")).await.unwrap();
        assert!(get_hardcoded(&pool, &id).await.unwrap().is_some());

        delete_registry(&pool, &id).await.unwrap();
        assert!(get_hardcoded(&pool, &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unified_create_builds_profile_in_one_transaction() {
        let pool = test_pool().await;
        let key = create_security_key(&pool, "n8n-key", None, "u1").await.unwrap();

        let profile = ProfileSpec::N8n(N8nProfile {
            external_url: "https://n8n.example.com/webhook/1".to_string(),
            security_key_id: key.id.clone(),
            return_direct: true,
            is_isolated: false,
            stream_if_single_tool: false,
            flash_answer_needed: false,
            timeout_seconds: 30,
        });
        let id = create_tool_with_profile(&pool, &registry("flow", ToolType::N8n), &[], &profile)
            .await
            .unwrap();

        let row = get_registry(&pool, &id).await.unwrap().unwrap();
        assert_eq!(row.tool_type, "N8N");
        let url: String = sqlx::query_scalar("SELECT external_url FROM n8n_tools WHERE id = ?1")
            .bind(&id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(url, "https://n8n.example.com/webhook/1");
    }

    #[tokio::test]
    async fn unified_create_rolls_back_on_invalid_tags() {
        let pool = test_pool().await;
        let profile = ProfileSpec::Hardcoded { notes: None };
        let err = create_tool_with_profile(
            &pool,
            &registry("ghost", ToolType::HardCoded),
            &["bogus".to_string()],
            &profile,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::BadRequest("invalid_tag_ids")));
        assert!(get_registry(&pool, "ghost").await.unwrap().is_none());
        assert!(list_registry(&pool, None, None).await.unwrap().is_empty());
    }
}
