//! Authentication & authorization
//!
//! Request flow: the [`middleware::auth_middleware`] gate extracts the auth
//! cookie ([`cookie::extract_token`]), verifies it ([`token::TokenVerifier`])
//! and injects a [`CurrentUser`] extension. Route handlers that guard
//! privileged mutations then consult the role store, optionally upgrading
//! the user id through [`identity::IdentityResolver`] first.

pub mod cookie;
pub mod identity;
pub mod middleware;
pub mod token;

pub use cookie::extract_token;
pub use identity::{IdentityError, IdentityResolver, UpstreamMe};
pub use middleware::auth_middleware;
pub use token::{AuthError, CurrentUser, TokenVerifier};
