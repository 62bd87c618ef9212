//! HTTP client integration tests.
//!
//! These run the reqwest client against a local axum server standing in for
//! the Basecamp API.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bcq_core::api::{BasecampApi, HttpClient};
use bcq_core::pagination::ListOptions;
use bcq_core::{BcqError, ErrorCode};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const TOKEN: &str = "test-token-123";

#[derive(Clone, Default)]
struct Hits(Arc<AtomicUsize>);

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", TOKEN))
}

/// Three pages of two projects each, linked with `rel="next"`.
async fn projects(
    State(hits): State<Hits>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    hits.0.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "Bad token"}))).into_response();
    }
    let page: i64 = q.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let items = json!([
        {"id": page * 10 + 1, "name": format!("Project {}a", page)},
        {"id": page * 10 + 2, "name": format!("Project {}b", page)},
    ]);
    let mut response = Json(items).into_response();
    if page < 3 {
        let link = format!(
            "<http://{}/999/projects.json?page={}>; rel=\"next\"",
            host,
            page + 1
        );
        response
            .headers_mut()
            .insert(header::LINK, link.parse().unwrap());
    }
    response
}

async fn echo(Json(body): Json<Value>) -> impl IntoResponse {
    (StatusCode::CREATED, Json(json!({"id": 555, "echo": body})))
}

async fn rate_limited() -> Response {
    let mut response = StatusCode::TOO_MANY_REQUESTS.into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, "30".parse().unwrap());
    response
}

async fn unavailable() -> impl IntoResponse {
    StatusCode::SERVICE_UNAVAILABLE
}

async fn no_content() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

async fn validation_error() -> impl IntoResponse {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({"error": "Content can't be blank"})),
    )
}

async fn blob() -> impl IntoResponse {
    "x".repeat(64 * 1024)
}

async fn spawn_server() -> (String, Hits) {
    let hits = Hits::default();
    let app = Router::new()
        .route("/999/projects.json", get(projects))
        .route("/999/buckets/1/chats/2/lines.json", post(echo))
        .route(
            "/999/buckets/1/todos/3/completion.json",
            post(no_content).delete(no_content),
        )
        .route("/999/buckets/1/todos/4.json", post(validation_error))
        .route("/999/limited.json", get(rate_limited))
        .route("/999/down.json", get(unavailable))
        .route("/files/blob.bin", get(blob))
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), hits)
}

fn client(base: &str) -> HttpClient {
    HttpClient::new(
        base,
        Some("999".to_string()),
        Some(SecretString::from(TOKEN.to_string())),
    )
    .unwrap()
}

// =============================================================================
// Pagination
// =============================================================================

mod pagination {
    use super::*;

    #[tokio::test]
    async fn all_follows_every_next_link() {
        let (base, hits) = spawn_server().await;
        let listing = client(&base)
            .get_all("/projects.json", &ListOptions::all())
            .await
            .unwrap();

        assert_eq!(listing.items.len(), 6);
        assert!(!listing.has_more);
        assert_eq!(hits.0.load(Ordering::SeqCst), 3);
        assert_eq!(listing.items[5]["id"], 32);
    }

    #[tokio::test]
    async fn limit_stops_early_and_reports_more() {
        let (base, hits) = spawn_server().await;
        let listing = client(&base)
            .get_all("/projects.json", &ListOptions::limit(3))
            .await
            .unwrap();

        assert_eq!(listing.items.len(), 3);
        assert!(listing.has_more);
        assert_eq!(hits.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn first_page_only() {
        let (base, hits) = spawn_server().await;
        let listing = client(&base)
            .get_all("/projects.json", &ListOptions::first_page())
            .await
            .unwrap();

        assert_eq!(listing.items.len(), 2);
        assert!(listing.has_more);
        assert_eq!(hits.0.load(Ordering::SeqCst), 1);
    }
}

// =============================================================================
// Requests
// =============================================================================

mod requests {
    use super::*;

    #[tokio::test]
    async fn post_sends_json_body() {
        let (base, _) = spawn_server().await;
        let created = client(&base)
            .post(
                "/buckets/1/chats/2/lines.json",
                &json!({"content": "Hello team!"}),
            )
            .await
            .unwrap();

        assert_eq!(created["id"], 555);
        assert_eq!(created["echo"]["content"], "Hello team!");
    }

    #[tokio::test]
    async fn no_content_is_null() {
        let (base, _) = spawn_server().await;
        let c = client(&base);
        let value = c
            .post("/buckets/1/todos/3/completion.json", &json!({}))
            .await
            .unwrap();
        assert!(value.is_null());
        c.delete("/buckets/1/todos/3/completion.json").await.unwrap();
    }

    #[tokio::test]
    async fn download_streams_to_disk() {
        let (base, _) = spawn_server().await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("blob.bin");

        let written = client(&base)
            .download(&format!("{}/files/blob.bin", base), &dest)
            .await
            .unwrap();

        assert_eq!(written, 64 * 1024);
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 64 * 1024);
    }
}

// =============================================================================
// Error translation
// =============================================================================

mod errors {
    use super::*;

    #[tokio::test]
    async fn missing_token_never_sends() {
        let (base, hits) = spawn_server().await;
        let c = HttpClient::new(&base, Some("999".to_string()), None).unwrap();

        let err = c.get("/projects.json").await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::Auth);
        assert_eq!(hits.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn bad_token_is_auth_error() {
        let (base, _) = spawn_server().await;
        let c = HttpClient::new(
            &base,
            Some("999".to_string()),
            Some(SecretString::from("wrong".to_string())),
        )
        .unwrap();

        let err = c.get("/projects.json").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Auth);
        assert_eq!(err.to_string(), "Bad token");
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (base, _) = spawn_server().await;
        let err = client(&base).get("/buckets/1/todos/9.json").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.code().exit_code(), 2);
    }

    #[tokio::test]
    async fn rate_limit_carries_retry_after() {
        let (base, _) = spawn_server().await;
        let err = client(&base).get("/limited.json").await.unwrap_err();
        assert!(matches!(err, BcqError::RateLimited { retry_after: Some(30) }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn service_unavailable_is_retryable_api_error() {
        let (base, _) = spawn_server().await;
        let err = client(&base).get("/down.json").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Api);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn validation_message_is_surfaced() {
        let (base, _) = spawn_server().await;
        let err = client(&base)
            .post("/buckets/1/todos/4.json", &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Content can't be blank");
    }

    #[tokio::test]
    async fn truncated_error_body_keeps_status() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 502 Bad Gateway\r\nContent-Length: 100\r\n\r\n{\"err")
                .await;
            let _ = socket.shutdown().await;
        });

        let err = client(&format!("http://{}", addr))
            .get("/projects.json")
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Api);
        assert_eq!(err.to_string(), "Server error (502)");
        assert!(err.is_retryable());
    }
}
