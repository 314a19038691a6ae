//! Reverse proxy to the agent-serving backend.
//!
//! Content-agnostic forwarding: POST bodies are relayed as raw bytes with
//! no JSON validation, upstream bodies are streamed back without
//! buffering, and the upstream status passes through unchanged. Two
//! policies apply at the boundary:
//!
//! - **Outbound credentials**: `Content-Type: application/json` is always
//!   set. When a server-side API key is configured it replaces any
//!   `Authorization` header; when it is not, an inbound `Authorization`
//!   header is removed; a client must never reach the upstream with its
//!   own credentials.
//! - **Response headers**: only [`ALLOWED_RESPONSE_HEADERS`] pass back to
//!   the caller. Cookies, tracing headers and everything else the
//!   upstream sets are dropped.
//!
//! No retries and no timeouts here; upstream failures propagate to the
//! error layer.

use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Method, header},
    response::Response,
};
use bytes::Bytes;

use crate::config::Settings;
use crate::{Error, Result};

/// Response headers relayed to the caller; everything else is dropped.
/// Matched by exact (lowercased) name, not pattern.
pub const ALLOWED_RESPONSE_HEADERS: [&str; 4] = [
    "content-type",
    "content-length",
    "transfer-encoding",
    "cache-control",
];

/// Forwards requests to the agent backend.
#[derive(Debug)]
pub struct AgnoProxy {
    http: reqwest::Client,
    base: String,
    auth_header: Option<HeaderValue>,
}

impl AgnoProxy {
    /// Build a proxy from the loaded settings and a shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the configured API key cannot form
    /// a valid `Authorization` header value.
    pub fn new(settings: &Settings, http: reqwest::Client) -> Result<Self> {
        let auth_header = settings
            .agno_api_key
            .as_ref()
            .map(|key| {
                HeaderValue::from_str(&format!("Bearer {key}")).map_err(|_| {
                    Error::Config("AGNO_API_KEY contains invalid header characters".to_string())
                })
            })
            .transpose()?;

        Ok(Self {
            http,
            base: settings.agno_base().to_string(),
            auth_header,
        })
    }

    /// Forward a GET to `path` on the upstream.
    pub async fn get(&self, path: &str) -> Result<Response> {
        self.forward(Method::GET, path, None, None).await
    }

    /// Forward a DELETE to `path` on the upstream.
    pub async fn delete(&self, path: &str) -> Result<Response> {
        self.forward(Method::DELETE, path, None, None).await
    }

    /// Forward a POST, relaying the incoming body verbatim. The incoming
    /// headers form the base of the outbound set so client-supplied
    /// non-auth headers pass through.
    pub async fn post(&self, path: &str, incoming: &HeaderMap, body: Bytes) -> Result<Response> {
        self.forward(Method::POST, path, Some(incoming), Some(body))
            .await
    }

    async fn forward(
        &self,
        method: Method,
        path: &str,
        incoming: Option<&HeaderMap>,
        body: Option<Bytes>,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base, path);
        let mut request = self
            .http
            .request(method, &url)
            .headers(self.server_headers(incoming));
        if let Some(body) = body {
            request = request.body(body);
        }
        let upstream = request.send().await?;
        Ok(relay_response(upstream))
    }

    /// Outbound header set: incoming headers (if any) as the base, with
    /// the content-type and credential rules applied on top.
    fn server_headers(&self, incoming: Option<&HeaderMap>) -> HeaderMap {
        let mut headers = incoming.cloned().unwrap_or_default();
        // reqwest owns these on the rebuilt request
        headers.remove(header::HOST);
        headers.remove(header::CONTENT_LENGTH);

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        match &self.auth_header {
            Some(value) => {
                headers.insert(header::AUTHORIZATION, value.clone());
            }
            None => {
                headers.remove(header::AUTHORIZATION);
            }
        }
        headers
    }
}

/// Upstream response → caller response: status unchanged, headers
/// filtered to the allow-list, body streamed through.
fn relay_response(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = HeaderMap::new();
    for (name, value) in upstream.headers() {
        if ALLOWED_RESPONSE_HEADERS.contains(&name.as_str()) {
            headers.append(name.clone(), value.clone());
        }
    }

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
