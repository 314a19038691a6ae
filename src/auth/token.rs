//! Auth cookie verification — HS256 JWT validation and claim mapping.
//!
//! # Verification flow
//!
//! 1. Verify the signature against the shared `JWT_SECRET` (HS256 only).
//! 2. Enforce issuer/audience only when configured; `exp` is enforced when
//!    present but a token without one still validates.
//! 3. Map claims to a normalized [`CurrentUser`], choosing the identifier
//!    through the `sub` → email → `device_id` fallback chain.
//!
//! Verification is pure and synchronous: no I/O, no clock beyond the
//! library's own `exp` check.

use std::collections::HashSet;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::config::Settings;

/// Error variants for cookie verification failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Signature, issuer, audience or expiry check failed.
    #[error("JWT verification failed: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    /// None of `sub`, email or `device_id` is present.
    #[error("token has no identifier (sub/email/device_id)")]
    MissingIdentifier,
}

/// Normalized identity for the lifetime of one request.
///
/// Built fresh from a verified token at request entry, optionally upgraded
/// by the canonical-identity resolver, and discarded with the response.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Primary identifier (`sub`, falling back to email, then `device_id`)
    pub id: String,
    /// Email from `user_data.email` or the top-level `email` claim
    pub email: Option<String>,
    /// Role names carried in the token, if any
    pub roles: Option<Vec<String>>,
    /// Tenant from the `tenant` or `tenant_id` claim
    pub tenant_id: Option<String>,
    /// Always true once verification succeeded
    pub active: bool,
    /// Session identifier claim
    pub session_id: Option<String>,
    /// Device identifier claim
    pub device_id: Option<String>,
}

impl CurrentUser {
    /// Whether the token itself carries the given role name.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles
            .as_ref()
            .is_some_and(|roles| roles.iter().any(|r| r == role))
    }
}

#[derive(Debug, Deserialize)]
struct UserData {
    #[serde(default)]
    email: Option<String>,
}

/// Raw claims as they appear on the wire.
#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_data: Option<UserData>,
    #[serde(default)]
    roles: Option<Vec<String>>,
    #[serde(default)]
    tenant: Option<String>,
    #[serde(default)]
    tenant_id: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    device_id: Option<String>,
}

/// Verifies auth cookies against the static process configuration.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Build a verifier from the loaded settings.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` is optional on purpose: it is enforced when present, but
        // tokens without one still validate.
        validation.required_spec_claims = HashSet::new();
        validation.validate_aud = false;
        if let Some(iss) = &settings.jwt_iss {
            validation.set_issuer(&[iss]);
        }
        if let Some(aud) = &settings.jwt_aud {
            validation.set_audience(&[aud]);
            validation.validate_aud = true;
        }

        Self {
            key: DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Verify a token and map its claims to a [`CurrentUser`].
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidToken`] on any signature/issuer/audience/expiry
    /// failure; [`AuthError::MissingIdentifier`] when no identifier claim
    /// is present.
    pub fn verify(&self, token: &str) -> Result<CurrentUser, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)?;
        let claims = data.claims;

        let email = claims.user_data.and_then(|u| u.email).or(claims.email);

        // Identifier fallback chain: sub → email → device_id. Empty strings
        // count as absent.
        let id = [
            claims.sub.as_deref(),
            email.as_deref(),
            claims.device_id.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find(|v| !v.is_empty())
        .ok_or(AuthError::MissingIdentifier)?
        .to_string();

        Ok(CurrentUser {
            id,
            email,
            roles: claims.roles,
            tenant_id: claims.tenant.or(claims.tenant_id),
            active: true,
            session_id: claims.session_id,
            device_id: claims.device_id,
        })
    }
}
