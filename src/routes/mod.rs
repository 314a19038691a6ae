//! HTTP route handlers
//!
//! Thin glue between the auth/identity/proxy core and the store. Handlers
//! receive the verified [`crate::auth::CurrentUser`] as a request
//! extension (injected by the gate) and shape responses to match the
//! public API contract.

pub mod agno;
pub mod dust;
pub mod hardcoded;
pub mod n8n;
pub mod registry;
pub mod roles;
pub mod security_keys;
pub mod tags;
pub mod tools;
pub mod user;

use axum::http::{HeaderMap, header};
use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// The caller's raw `Cookie` header, for credential delegation upstream.
pub(crate) fn cookie_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::COOKIE).and_then(|v| v.to_str().ok())
}

/// Parse a JSON body, failing with the route's malformed-JSON code.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &Bytes, code: &'static str) -> Result<T> {
    serde_json::from_slice(body).map_err(|_| Error::BadRequest(code))
}

/// Parse a JSON body, treating malformed JSON as an empty payload so the
/// route's own missing-field checks produce the client-facing error.
pub(crate) fn parse_json_lenient<T: DeserializeOwned + Default>(body: &Bytes) -> T {
    serde_json::from_slice(body).unwrap_or_default()
}

/// A trimmed, non-empty string or nothing.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
