//! Error types for toolgate
//!
//! Every failure surfaced to an HTTP client maps to a status code and a
//! small `{"error": <code>}` JSON body. Stack traces and verification
//! internals never reach the wire.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for toolgate
pub type Result<T> = std::result::Result<T, Error>;

/// Toolgate errors
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid auth cookie (HTTP 401)
    #[error("unauthorized")]
    Unauthorized,

    /// Authenticated but lacking the required role (HTTP 403)
    #[error("forbidden")]
    Forbidden,

    /// Resource id does not exist (HTTP 404)
    #[error("not found: {0}")]
    NotFound(&'static str),

    /// Unique-constraint violation (HTTP 409)
    #[error("conflict: {0}")]
    Conflict(&'static str),

    /// Malformed JSON, missing fields or invalid references (HTTP 400)
    #[error("bad request: {0}")]
    BadRequest(&'static str),

    /// Configuration error (fatal at boot, never surfaced to clients)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Relational store error (HTTP 500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Upstream HTTP error (HTTP 500)
    #[error("Upstream error: {0}")]
    Upstream(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error with a stable client-facing code (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(&'static str),
}

impl Error {
    /// The stable code string rendered in the JSON error body.
    #[must_use]
    pub fn client_code(&self) -> &str {
        match self {
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound(code)
            | Self::Conflict(code)
            | Self::BadRequest(code)
            | Self::Internal(code) => code,
            Self::Config(_) => "config_error",
            Self::Database(_) | Self::Upstream(_) | Self::Io(_) => "internal_error",
        }
    }

    /// HTTP status code this error maps to.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Config(_)
            | Self::Database(_)
            | Self::Upstream(_)
            | Self::Io(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.client_code() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_taxonomy() {
        assert_eq!(Error::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            Error::NotFound("Not found").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Conflict("system_name_conflict").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::BadRequest("missing_fields").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Internal("create_failed").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn client_codes_are_stable() {
        assert_eq!(Error::Unauthorized.client_code(), "Unauthorized");
        assert_eq!(Error::Forbidden.client_code(), "forbidden");
        assert_eq!(Error::NotFound("registry_not_found").client_code(), "registry_not_found");
        assert_eq!(
            Error::Conflict("explicit_call_name_conflict").client_code(),
            "explicit_call_name_conflict"
        );
    }
}
