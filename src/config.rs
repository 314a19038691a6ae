//! Configuration management
//!
//! All settings come from the process environment (optionally via a `.env`
//! file). `JWT_SECRET` is required: the process refuses to boot without
//! it. Everything else has a default or degrades gracefully: no
//! `MAIN_USERINFO_URL` means canonical-identity resolution is skipped, no
//! `AGNO_API_KEY` means the proxy strips client `Authorization` headers
//! instead of replacing them.

use std::env;

use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Environment variables consumed verbatim (mapped to the lowercased
/// field of the same name).
const ENV_KEYS: &[&str] = &[
    "HOST",
    "PORT",
    "DATABASE_URL",
    "JWT_SECRET",
    "AUTH_COOKIE_NAME",
    "JWT_ISS",
    "JWT_AUD",
    "MAIN_USERINFO_URL",
    "AGNO_API_KEY",
    "ADMIN_USER_ID",
];

/// Runtime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// SQLite connection string
    pub database_url: String,
    /// Shared secret for HS256 cookie verification (required)
    pub jwt_secret: String,
    /// Name of the auth cookie
    pub auth_cookie_name: String,
    /// Strict issuer check, enforced only when set
    pub jwt_iss: Option<String>,
    /// Strict audience check, enforced only when set
    pub jwt_aud: Option<String>,
    /// Upstream identity service (GraphQL `me` endpoint), optional
    pub main_userinfo_url: Option<String>,
    /// Base URL of the agent-serving backend
    pub agno_api_url: String,
    /// Server-side bearer key for the agent backend, optional
    pub agno_api_key: Option<String>,
    /// Verbose logging of auth decisions (server-side logs only)
    pub auth_debug: bool,
    /// User id granted ADMIN by the `seed` subcommand, optional
    pub admin_user_id: Option<String>,
    /// Whether `seed` creates the demo security key
    pub seed_create_security_key: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            database_url: "sqlite://toolgate.db?mode=rwc".to_string(),
            jwt_secret: String::new(),
            auth_cookie_name: "auth_token".to_string(),
            jwt_iss: None,
            jwt_aud: None,
            main_userinfo_url: None,
            agno_api_url: "http://localhost:7777".to_string(),
            agno_api_key: None,
            auth_debug: false,
            admin_user_id: None,
            seed_create_security_key: false,
        }
    }
}

impl Settings {
    /// Load settings from the environment (and `.env`, if present).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `JWT_SECRET` is missing or a
    /// configured upstream URL does not parse.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let figment =
            Figment::from(Serialized::defaults(Self::default())).merge(Env::raw().only(ENV_KEYS));

        let mut settings: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        // String-valued flags accept "true" (any case) or "1"
        settings.auth_debug = flag_enabled(env::var("AUTH_DEBUG").ok().as_deref());
        settings.seed_create_security_key =
            matches!(env::var("SEED_CREATE_SECURITY_KEY").ok().as_deref(), Some("1"));

        // Agent backend base: AGNO_API_URL wins over the public variant
        if let Ok(v) = env::var("AGNO_API_URL") {
            settings.agno_api_url = v;
        } else if let Ok(v) = env::var("NEXT_PUBLIC_AGNO_API_URL") {
            settings.agno_api_url = v;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on a missing secret or malformed URL.
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.is_empty() {
            return Err(Error::Config(
                "JWT_SECRET is required for auth cookie verification".to_string(),
            ));
        }
        if let Some(url) = &self.main_userinfo_url {
            Url::parse(url)
                .map_err(|e| Error::Config(format!("Invalid MAIN_USERINFO_URL: {e}")))?;
        }
        Url::parse(&self.agno_api_url)
            .map_err(|e| Error::Config(format!("Invalid AGNO_API_URL: {e}")))?;
        Ok(())
    }

    /// Agent backend base URL with any trailing slash stripped.
    #[must_use]
    pub fn agno_base(&self) -> &str {
        self.agno_api_url.trim_end_matches('/')
    }
}

/// Parse a "true"/"1" style environment flag.
fn flag_enabled(value: Option<&str>) -> bool {
    match value {
        Some(v) => v.eq_ignore_ascii_case("true") || v == "1",
        None => false,
    }
}
