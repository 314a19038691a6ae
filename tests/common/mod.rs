//! Shared helpers for the integration suites.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, Response, StatusCode, header};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

use toolgate::config::Settings;
use toolgate::router::create_router;
use toolgate::server::build_state;
use toolgate::store;

/// Shared secret every test token is signed with.
pub const SECRET: &str = "integration-secret";

/// A fully wired application over a throwaway database.
pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    _tmp: TempDir,
}

/// Build the app, letting the caller adjust settings first.
pub async fn spawn_app(mutate: impl FnOnce(&mut Settings)) -> TestApp {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("toolgate-test.db");
    let mut settings = Settings {
        jwt_secret: SECRET.to_string(),
        database_url: format!("sqlite://{}", db_path.display()),
        ..Settings::default()
    };
    mutate(&mut settings);

    let state = build_state(settings).await.unwrap();
    let pool = state.db.clone();
    let router = create_router(state);
    TestApp {
        router,
        pool,
        _tmp: tmp,
    }
}

/// Seed the base roles and grant ADMIN to `user_id`.
pub async fn grant_admin(pool: &SqlitePool, user_id: &str) {
    let settings = Settings {
        jwt_secret: SECRET.to_string(),
        admin_user_id: Some(user_id.to_string()),
        ..Settings::default()
    };
    store::seed(pool, &settings).await.unwrap();
}

/// Sign arbitrary claims with the shared test secret.
pub fn sign(claims: &Value) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

/// A minimal valid token for `sub`.
pub fn token_for(sub: &str) -> String {
    sign(&serde_json::json!({ "sub": sub }))
}

/// The auth cookie header value for a token.
pub fn auth_cookie(token: &str) -> String {
    format!("auth_token={token}")
}

/// Build a bodyless request.
pub fn request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// Build a JSON request.
pub fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Drive one request through the router.
pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// One request as observed by a fake upstream.
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A fake upstream HTTP server on an ephemeral port.
pub struct Upstream {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl Upstream {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// Spawn an upstream that records every request and answers with a fixed
/// status, body and header set.
pub async fn spawn_upstream(
    status: u16,
    response_body: &'static str,
    response_headers: &'static [(&'static str, &'static str)],
) -> Upstream {
    let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&requests);

    let app = Router::new().fallback(move |req: Request<Body>| {
        let recorded = Arc::clone(&recorded);
        async move {
            let (parts, body) = req.into_parts();
            let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
            recorded.lock().unwrap().push(RecordedRequest {
                method: parts.method.to_string(),
                path: parts.uri.path().to_string(),
                headers: parts.headers,
                body: bytes,
            });

            let mut builder = Response::builder().status(StatusCode::from_u16(status).unwrap());
            for (name, value) in response_headers {
                builder = builder.header(*name, *value);
            }
            builder.body(Body::from(response_body)).unwrap()
        }
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Upstream { addr, requests }
}
