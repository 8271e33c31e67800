use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

use ledgerlink_server::{api::app_router, auth::Claims, build_state, config::Config};

const JWT_SECRET: &str = "integration-secret";

fn test_config(tmp: &TempDir, cron_secret: Option<&str>) -> Config {
    Config {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        db_path: tmp.path().join("test.db").to_string_lossy().to_string(),
        blob_dir: tmp.path().join("blobs").to_string_lossy().to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        cron_secret: cron_secret.map(str::to_string),
        sync_interval: None,
        sync_deadline: Some(Duration::from_secs(60)),
        request_timeout: Duration::from_millis(5_000),
        token_api_url: None,
        session_api_url: None,
        cors_allow: vec!["*".to_string()],
    }
}

async fn build_test_router(tmp: &TempDir, cron_secret: Option<&str>) -> Router {
    let config = test_config(tmp, cron_secret);
    let state = build_state(&config).await.unwrap();
    app_router(state, &config)
}

fn bearer(user_id: &str) -> String {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now.as_secs() + 3600) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {token}")
}

fn post_json(uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn body(value: Value) -> Body {
    Body::from(value.to_string())
}

#[tokio::test]
async fn healthz_reports_ok() {
    let tmp = tempdir().unwrap();
    let app = build_test_router(&tmp, None).await;

    let (status, body) = send(
        &app,
        Request::builder()
            .uri("/api/v1/healthz")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn organization_sync_requires_bearer() {
    let tmp = tempdir().unwrap();
    let app = build_test_router(&tmp, None).await;
    let payload = json!({ "organization_id": "org-1" });

    let (status, response) = send(
        &app,
        post_json("/api/v1/billing/sync")
            .body(body(payload))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response["code"], 401);
}

#[tokio::test]
async fn organization_sync_rejects_non_members() {
    let tmp = tempdir().unwrap();
    let app = build_test_router(&tmp, None).await;
    let payload = json!({ "organization_id": "org-1" });

    let (status, response) = send(
        &app,
        post_json("/api/v1/billing/sync")
            .header(header::AUTHORIZATION, bearer("user-1"))
            .body(body(payload))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(response["code"], 403);
    assert!(response["message"].is_string());
}

#[tokio::test]
async fn sync_without_target_is_a_bad_request() {
    let tmp = tempdir().unwrap();
    let app = build_test_router(&tmp, None).await;
    let payload = json!({});

    let (status, _) = send(
        &app,
        post_json("/api/v1/billing/sync")
            .header(header::AUTHORIZATION, bearer("user-1"))
            .body(body(payload))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sync_without_target_or_bearer_is_unauthorized() {
    let tmp = tempdir().unwrap();
    let app = build_test_router(&tmp, None).await;

    let (status, response) = send(
        &app,
        post_json("/api/v1/billing/sync")
            .body(body(json!({})))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response["code"], 401);
}

#[tokio::test]
async fn batch_sync_with_no_organizations_returns_zero_counts() {
    let tmp = tempdir().unwrap();
    let app = build_test_router(&tmp, None).await;
    let payload = json!({ "sync_all": true });

    let (status, response) = send(
        &app,
        post_json("/api/v1/billing/sync")
            .body(body(payload))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        response,
        json!({
            "total": 0,
            "matched": 0,
            "not_matched": 0,
            "orgs_processed": 0,
            "orgs_failed": 0
        })
    );
}

#[tokio::test]
async fn batch_sync_checks_cron_secret_when_configured() {
    let tmp = tempdir().unwrap();
    let app = build_test_router(&tmp, Some("cron-123")).await;
    let payload = json!({ "sync_all": true });

    let (missing, _) = send(
        &app,
        post_json("/api/v1/billing/sync")
            .body(body(payload.clone()))
            .unwrap(),
    )
    .await;
    assert_eq!(missing, StatusCode::UNAUTHORIZED);

    let (wrong, _) = send(
        &app,
        post_json("/api/v1/billing/sync")
            .header("x-cron-secret", "nope")
            .body(body(payload.clone()))
            .unwrap(),
    )
    .await;
    assert_eq!(wrong, StatusCode::UNAUTHORIZED);

    let (ok, _) = send(
        &app,
        post_json("/api/v1/billing/sync")
            .header("x-cron-secret", "cron-123")
            .body(body(payload))
            .unwrap(),
    )
    .await;
    assert_eq!(ok, StatusCode::OK);
}

#[tokio::test]
async fn cancel_requires_sale_or_payment() {
    let tmp = tempdir().unwrap();
    let app = build_test_router(&tmp, None).await;
    let payload = json!({
        "organization_id": "org-1",
        "external_id": "42",
        "document_type": "invoice",
        "reason": "typo"
    });

    let (status, response) = send(
        &app,
        post_json("/api/v1/billing/cancel")
            .header(header::AUTHORIZATION, bearer("user-1"))
            .body(body(payload))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["code"], 400);
}

#[tokio::test]
async fn cancel_requires_bearer() {
    let tmp = tempdir().unwrap();
    let app = build_test_router(&tmp, None).await;
    let payload = json!({
        "sale_id": "sale-1",
        "organization_id": "org-1",
        "external_id": "42",
        "document_type": "invoice",
        "reason": "typo"
    });

    let (status, _) = send(
        &app,
        post_json("/api/v1/billing/cancel")
            .header(header::AUTHORIZATION, "Bearer not-a-token")
            .body(body(payload))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
