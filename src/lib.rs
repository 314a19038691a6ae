//! Toolgate library
//!
//! HTTP service in front of a tools registry and an agent-serving backend:
//!
//! - **Cookie auth**: HS256 JWT in an auth cookie, verified per request and
//!   mapped to a normalized [`auth::CurrentUser`]
//! - **Role gating**: DB-backed ADMIN/USER membership consulted per
//!   privileged mutation
//! - **Canonical identity**: optional upstream GraphQL `me` lookup that
//!   upgrades the token-derived user id, soft-failing to the local id
//! - **Reverse proxy**: transparent chat/session forwarding to the agent
//!   backend with response-header allow-listing
//! - **Registry CRUD**: tools registry, per-type tool profiles, tags and
//!   security keys over SQLite

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod proxy;
pub mod router;
pub mod routes;
pub mod server;
pub mod store;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}
