//! Relational store
//!
//! SQLite via sqlx. The pool is the one shared handle in the process,
//! constructed once at boot by the composition root and injected into the
//! router state; there are no module-level singletons. Schema creation is
//! idempotent so a fresh database file is usable immediately.

pub mod models;
pub mod queries;

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;
use uuid::Uuid;

use crate::config::Settings;
use crate::{Error, Result};

/// Idempotent schema. Column names mirror the API's snake_case wire
/// fields; timestamps are stored as RFC 3339 text.
const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS roles (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    description TEXT
);

CREATE TABLE IF NOT EXISTS user_roles (
    id      TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    role_id TEXT NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
    org_id  TEXT,
    UNIQUE (user_id, role_id, org_id)
);

CREATE TABLE IF NOT EXISTS tags (
    id   TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS security_keys (
    id                 TEXT PRIMARY KEY,
    system_name        TEXT NOT NULL UNIQUE,
    description        TEXT,
    created_by_user_id TEXT,
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tools_registry (
    id                 TEXT PRIMARY KEY,
    explicit_call_name TEXT NOT NULL UNIQUE,
    readable_name      TEXT NOT NULL,
    description        TEXT,
    tool_type          TEXT NOT NULL CHECK (tool_type IN ('HARD_CODED', 'N8N', 'DUST')),
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tool_tags (
    tool_id TEXT NOT NULL REFERENCES tools_registry(id) ON DELETE CASCADE,
    tag_id  TEXT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (tool_id, tag_id)
);

CREATE TABLE IF NOT EXISTS hardcoded_tools (
    id    TEXT PRIMARY KEY REFERENCES tools_registry(id) ON DELETE CASCADE,
    notes TEXT
);

CREATE TABLE IF NOT EXISTS n8n_tools (
    id                    TEXT PRIMARY KEY REFERENCES tools_registry(id) ON DELETE CASCADE,
    external_url          TEXT NOT NULL,
    security_key_id       TEXT NOT NULL REFERENCES security_keys(id),
    return_direct         INTEGER NOT NULL DEFAULT 0,
    is_isolated           INTEGER NOT NULL DEFAULT 0,
    stream_if_single_tool INTEGER NOT NULL DEFAULT 0,
    flash_answer_needed   INTEGER NOT NULL DEFAULT 0,
    timeout_seconds       INTEGER NOT NULL DEFAULT 30
);

CREATE TABLE IF NOT EXISTS dust_tools (
    id                                  TEXT PRIMARY KEY REFERENCES tools_registry(id) ON DELETE CASCADE,
    dust_workspace_sid                  TEXT NOT NULL,
    dust_agent_sid                      TEXT NOT NULL,
    security_key_id                     TEXT NOT NULL REFERENCES security_keys(id),
    return_direct                       INTEGER NOT NULL DEFAULT 0,
    is_isolated                         INTEGER NOT NULL DEFAULT 0,
    stream_if_single_tool               INTEGER NOT NULL DEFAULT 0,
    api_timeout_seconds                 INTEGER NOT NULL DEFAULT 30,
    message_events_timeout_seconds      INTEGER NOT NULL DEFAULT 180,
    conversation_events_timeout_seconds INTEGER NOT NULL DEFAULT 30
);
";

/// Open the connection pool.
///
/// # Errors
///
/// Returns [`Error::Database`] when the URL is malformed or the database
/// cannot be opened.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| Error::Config(format!("Invalid DATABASE_URL: {e}")))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Create any missing tables.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

/// Seed the base roles and the optional bootstrap rows.
///
/// Safe to run repeatedly: every insert is `ON CONFLICT DO NOTHING`.
/// `ADMIN_USER_ID`, when set, is granted the ADMIN role;
/// `SEED_CREATE_SECURITY_KEY=1` inserts the demo security key.
pub async fn seed(pool: &SqlitePool, settings: &Settings) -> Result<()> {
    for (name, description) in [
        ("ADMIN", "Administrator with full access"),
        ("USER", "Regular user with limited access"),
    ] {
        sqlx::query(
            "INSERT INTO roles (id, name, description) VALUES (?1, ?2, ?3) \
             ON CONFLICT(name) DO NOTHING",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(description)
        .execute(pool)
        .await?;
    }
    info!("seeded base roles");

    if let Some(admin_user_id) = &settings.admin_user_id {
        let role_id: String = sqlx::query_scalar("SELECT id FROM roles WHERE name = 'ADMIN'")
            .fetch_one(pool)
            .await?;
        // NULL org_id values are distinct under SQLite UNIQUE, so the
        // conflict clause alone would not make this idempotent
        sqlx::query(
            "INSERT INTO user_roles (id, user_id, role_id, org_id) \
             SELECT ?1, ?2, ?3, NULL \
             WHERE NOT EXISTS (SELECT 1 FROM user_roles \
                               WHERE user_id = ?2 AND role_id = ?3 AND org_id IS NULL)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(admin_user_id)
        .bind(role_id)
        .execute(pool)
        .await?;
        info!(user = %admin_user_id, "granted ADMIN to bootstrap user");
    }

    if settings.seed_create_security_key {
        let now = chrono::Utc::now();
        sqlx::query(
            "INSERT INTO security_keys (id, system_name, description, created_by_user_id, created_at, updated_at) \
             VALUES (?1, 'demo-key', 'Demo security key', NULL, ?2, ?2) \
             ON CONFLICT(system_name) DO NOTHING",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(now)
        .execute(pool)
        .await?;
        info!("seeded demo security key");
    }

    Ok(())
}
