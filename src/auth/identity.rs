//! Canonical identity resolution against the upstream identity service.
//!
//! When `MAIN_USERINFO_URL` is configured, a single GraphQL `me` query is
//! POSTed with the caller's `Cookie` header (credential delegation). The
//! upstream id, when present, supersedes the token-derived id for the rest
//! of the request.
//!
//! [`IdentityResolver::resolve`] soft-fails: any upstream problem returns
//! the fallback id so the service stays usable while the identity service
//! is down. [`IdentityResolver::fetch_me`] is the strict variant used by
//! the user-info route, which surfaces upstream failures instead.

use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::config::Settings;

/// The fixed query sent to the identity service.
pub const ME_QUERY: &str = "query Me { me { id email } }";

/// Error variants for the strict `me` fetch.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The request never completed (DNS, connect, read failure).
    #[error("userinfo request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The identity service answered with a non-2xx status.
    #[error("userinfo returned status {0}")]
    Status(StatusCode),

    /// The response body was not valid JSON.
    #[error("userinfo response was not valid JSON")]
    BadBody,

    /// The response parsed but carries no `data.me` object.
    #[error("userinfo response has no data.me")]
    MissingMe,
}

/// Identity fields returned by the upstream `me` query.
#[derive(Debug, Clone, Default)]
pub struct UpstreamMe {
    /// Canonical user id, stringified (the upstream may send a number)
    pub id: Option<String>,
    /// Email on record upstream
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    #[serde(default)]
    data: Option<MeData>,
}

#[derive(Debug, Deserialize)]
struct MeData {
    #[serde(default)]
    me: Option<MeNode>,
}

#[derive(Debug, Deserialize)]
struct MeNode {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    email: Option<String>,
}

/// Resolves the canonical user id through the identity service.
pub struct IdentityResolver {
    http: reqwest::Client,
    url: Option<String>,
    debug: bool,
}

impl IdentityResolver {
    /// Build a resolver; `url` absent means resolution is a no-op.
    #[must_use]
    pub fn new(settings: &Settings, http: reqwest::Client) -> Self {
        Self {
            http,
            url: settings.main_userinfo_url.clone(),
            debug: settings.auth_debug,
        }
    }

    /// Whether an upstream identity service is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    /// Resolve the canonical user id, soft-failing to `fallback_id`.
    ///
    /// With no configured URL this returns immediately without any I/O
    /// (the common path). Otherwise one attempt is made; every failure mode
    /// (network, non-2xx, bad body, missing id) yields the fallback.
    pub async fn resolve(&self, cookie_header: Option<&str>, fallback_id: &str) -> String {
        if self.url.is_none() {
            return fallback_id.to_string();
        }

        match self.fetch_me(cookie_header).await {
            Ok(me) => me.id.unwrap_or_else(|| fallback_id.to_string()),
            Err(err) => {
                if self.debug {
                    debug!(error = %err, "canonical id resolution failed, using fallback");
                }
                fallback_id.to_string()
            }
        }
    }

    /// One strict `me` fetch. Callers must check [`Self::is_configured`]
    /// first; an unconfigured resolver reports [`IdentityError::MissingMe`].
    ///
    /// # Errors
    ///
    /// See [`IdentityError`]; each variant corresponds to one upstream
    /// failure mode. No retries are made.
    pub async fn fetch_me(&self, cookie_header: Option<&str>) -> Result<UpstreamMe, IdentityError> {
        let Some(url) = &self.url else {
            return Err(IdentityError::MissingMe);
        };

        let mut request = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&json!({ "query": ME_QUERY, "variables": {} }));
        if let Some(cookie) = cookie_header {
            request = request.header(reqwest::header::COOKIE, cookie);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            if self.debug {
                debug!(status = %status, "userinfo upstream not ok");
            }
            return Err(IdentityError::Status(status));
        }

        let body: MeResponse = response
            .json()
            .await
            .map_err(|_| IdentityError::BadBody)?;
        let me = body
            .data
            .and_then(|d| d.me)
            .ok_or(IdentityError::MissingMe)?;

        Ok(UpstreamMe {
            id: me.id.as_ref().and_then(id_string),
            email: me.email,
        })
    }
}

/// Stringify an upstream id, which may arrive as a JSON string or number.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
