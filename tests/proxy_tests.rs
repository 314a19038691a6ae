//! Reverse proxy end-to-end tests
//!
//! A real upstream listens on an ephemeral port and records everything the
//! proxy sends it, so the header policies (credential replacement,
//! response allow-listing) and the body-verbatim guarantee are observed on
//! the wire rather than inferred.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{auth_cookie, body_json, request, send, spawn_app, spawn_upstream, token_for};

const UPSTREAM_HEADERS: &[(&str, &str)] = &[
    ("content-type", "application/json"),
    ("x-trace-id", "abc"),
    ("set-cookie", "foo=bar"),
    ("cache-control", "no-store"),
];

fn chat_request(cookie: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/agno/chat/completions")
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-request-id", "req-42")
        .header(header::AUTHORIZATION, "Bearer client-token")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn chat_post_forwards_exact_body_to_upstream_path() {
    let upstream = spawn_upstream(200, r#"{"ok":true}"#, UPSTREAM_HEADERS).await;
    let url = upstream.url();
    let app = spawn_app(move |s| s.agno_api_url = url).await;

    let cookie = auth_cookie(&token_for("user-1"));
    let body = r#"{"messages":[{"role":"user","content":"hi"}],"stream":false}"#;
    let response = send(&app.router, chat_request(&cookie, body)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "ok": true }));

    let requests = upstream.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let recorded = &requests[0];
    assert_eq!(recorded.method, "POST");
    assert_eq!(recorded.path, "/chat/completions");
    assert_eq!(recorded.body.as_ref(), body.as_bytes());
}

#[tokio::test]
async fn response_headers_are_filtered_to_the_allow_list() {
    let upstream = spawn_upstream(200, r#"{"ok":true}"#, UPSTREAM_HEADERS).await;
    let url = upstream.url();
    let app = spawn_app(move |s| s.agno_api_url = url).await;

    let cookie = auth_cookie(&token_for("user-1"));
    let response = send(&app.router, chat_request(&cookie, "{}")).await;

    let headers = response.headers();
    assert_eq!(headers.get("content-type").unwrap(), "application/json");
    assert_eq!(headers.get("cache-control").unwrap(), "no-store");
    assert!(headers.get("x-trace-id").is_none());
    assert!(headers.get("set-cookie").is_none());
}

#[tokio::test]
async fn client_authorization_never_reaches_upstream_without_server_key() {
    let upstream = spawn_upstream(200, "{}", &[]).await;
    let url = upstream.url();
    let app = spawn_app(move |s| s.agno_api_url = url).await;

    let cookie = auth_cookie(&token_for("user-1"));
    send(&app.router, chat_request(&cookie, "{}")).await;

    let requests = upstream.requests.lock().unwrap();
    let recorded = &requests[0];
    assert!(recorded.headers.get("authorization").is_none());
    // Non-auth client headers pass through, content type is forced to JSON
    assert_eq!(recorded.headers.get("x-request-id").unwrap(), "req-42");
    assert_eq!(
        recorded.headers.get("content-type").unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn server_key_replaces_client_authorization() {
    let upstream = spawn_upstream(200, "{}", &[]).await;
    let url = upstream.url();
    let app = spawn_app(move |s| {
        s.agno_api_url = url;
        s.agno_api_key = Some("server-key".to_string());
    })
    .await;

    let cookie = auth_cookie(&token_for("user-1"));
    send(&app.router, chat_request(&cookie, "{}")).await;

    let requests = upstream.requests.lock().unwrap();
    assert_eq!(
        requests[0].headers.get("authorization").unwrap(),
        "Bearer server-key"
    );
}

#[tokio::test]
async fn upstream_status_passes_through_unchanged() {
    let upstream = spawn_upstream(503, r#"{"error":"overloaded"}"#, &[]).await;
    let url = upstream.url();
    let app = spawn_app(move |s| s.agno_api_url = url).await;

    let cookie = auth_cookie(&token_for("user-1"));
    let response = send(&app.router, chat_request(&cookie, "{}")).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn session_routes_build_encoded_upstream_paths() {
    let upstream = spawn_upstream(200, "[]", &[("content-type", "application/json")]).await;
    let url = upstream.url();
    let app = spawn_app(move |s| s.agno_api_url = url).await;
    let cookie = auth_cookie(&token_for("user-1"));

    let response = send(
        &app.router,
        request("GET", "/api/agno/sessions/agent%20one", Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app.router,
        request(
            "DELETE",
            "/api/agno/sessions/agent%20one/sess%2F1",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let requests = upstream.requests.lock().unwrap();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/sessions/agent%20one");
    assert_eq!(requests[1].method, "DELETE");
    assert_eq!(requests[1].path, "/sessions/agent%20one/sess%2F1");
}

#[tokio::test]
async fn proxy_routes_require_authentication() {
    let upstream = spawn_upstream(200, "{}", &[]).await;
    let url = upstream.url();
    let app = spawn_app(move |s| s.agno_api_url = url).await;

    let response = send(
        &app.router,
        request("POST", "/api/agno/chat/completions", None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    // The upstream must not have been touched
    assert_eq!(upstream.request_count(), 0);
}
