//! Auth cookie extraction
//!
//! Scans the single `Cookie` header for an exact, case-sensitive name
//! match. The value is everything after the first `=`, so cookie values
//! that themselves contain `=` (base64url padding and the like) survive
//! intact.
//! No URL-decoding is performed. A missing cookie is not an error; it just
//! means the request is unauthenticated.

use axum::http::{HeaderMap, header};

/// Extract the named cookie's raw value from the request headers.
#[must_use]
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in raw.split(';') {
        let pair = pair.trim_start();
        let mut parts = pair.splitn(2, '=');
        let name = parts.next().unwrap_or_default();
        if name == cookie_name {
            return Some(parts.next().unwrap_or_default().to_string());
        }
    }
    None
}
