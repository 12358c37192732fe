//! End-to-end login, authorization and refresh over the HTTP router

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use notegate::transport::{AppState, router};
use notegate::{InMemoryProfiles, JwtConfig, TokenManager, TokenPair, TokenSigner};
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &str = "integration-secret-key-at-least-32-bytes";
const PROVIDER_ISSUER: &str = "https://project.supabase.co/auth/v1";
const FAR_FUTURE: i64 = 4_102_444_800;

fn app() -> Router {
    let tokens = TokenManager::new(&JwtConfig::new(SECRET)).unwrap();
    router(AppState::new(tokens, Arc::new(InMemoryProfiles::new())))
}

fn sign_with(secret: &str, claims: &Value) -> String {
    TokenSigner::new(&JwtConfig::new(secret))
        .unwrap()
        .sign(claims)
        .unwrap()
}

fn provider_token(claims: &Value) -> String {
    sign_with(SECRET, claims)
}

fn unsigned_token(claims: &Value) -> String {
    format!(
        "{}.{}.x",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn login(app: &Router) -> TokenPair {
    let token = provider_token(&json!({
        "sub": "u1",
        "email": "a@b.com",
        "role": "authenticated",
        "iss": PROVIDER_ISSUER,
        "exp": FAR_FUTURE,
        "user_metadata": {"full_name": "Ada"}
    }));
    let (status, body) = send(app, post_json("/auth/callback", &json!({"access_token": token}))).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_value(body["tokens"].clone()).unwrap()
}

#[tokio::test]
async fn health_reports_version() {
    let (status, body) = send(&app(), get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn callback_issues_local_pair() {
    let app = app();
    let token = provider_token(&json!({
        "sub": "u1",
        "email": "a@b.com",
        "iss": PROVIDER_ISSUER,
        "exp": FAR_FUTURE,
        "user_metadata": {"full_name": "Ada"}
    }));

    let (status, body) = send(&app, post_json("/auth/callback", &json!({"access_token": token}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], "u1");
    assert_eq!(body["user"]["email"], "a@b.com");
    assert_eq!(body["user"]["metadata"]["full_name"], "Ada");
    assert_eq!(body["tokens"]["expires_in"], 900);
    assert_eq!(body["tokens"]["token_type"], "bearer");
}

#[tokio::test]
async fn callback_rejects_malformed_provider_token() {
    let app = app();
    for token in ["only.two", "a.!!!.c"] {
        let (status, body) =
            send(&app, post_json("/auth/callback", &json!({"access_token": token}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid token");
    }
}

#[tokio::test]
async fn callback_rejects_expired_provider_token() {
    let token = provider_token(&json!({"sub": "u1", "iss": PROVIDER_ISSUER, "exp": 1}));
    let (status, _) = send(&app(), post_json("/auth/callback", &json!({"access_token": token}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn callback_rejects_unsigned_and_foreign_tokens() {
    let app = app();
    let claims = json!({
        "sub": "victim-admin",
        "email": "root@corp",
        "role": "service_role",
        "iss": PROVIDER_ISSUER,
        "exp": FAR_FUTURE
    });
    let forged = [
        unsigned_token(&claims),
        sign_with("some-other-secret-at-least-32-bytes", &claims),
    ];

    for token in forged {
        let (status, body) =
            send(&app, post_json("/auth/callback", &json!({"access_token": token}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid token");
        assert!(body.get("tokens").is_none());
    }
}

#[tokio::test]
async fn callback_refuses_local_access_token() {
    let app = app();
    let pair = login(&app).await;
    let (status, _) = send(
        &app,
        post_json("/auth/callback", &json!({"access_token": pair.access_token})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn required_route_sets_identity() {
    let app = app();
    let pair = login(&app).await;

    let (status, body) = send(&app, get("/auth/user", Some(&pair.access_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": "u1", "email": "a@b.com", "role": "authenticated"}));
}

#[tokio::test]
async fn required_route_without_header_is_unauthorized() {
    let (status, body) = send(&app(), get("/auth/user", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authorization header required");
}

#[tokio::test]
async fn required_route_rejects_forged_signature() {
    let token = sign_with(
        "some-other-secret-at-least-32-bytes",
        &json!({"sub": "u1", "exp": FAR_FUTURE}),
    );
    let (status, body) = send(&app(), get("/auth/user", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid token");
}

#[tokio::test]
async fn optional_route_without_header_continues() {
    let (status, body) = send(&app(), get("/api/session", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"authenticated": false}));
}

#[tokio::test]
async fn optional_route_with_token() {
    let app = app();
    let pair = login(&app).await;
    let (status, body) = send(&app, get("/api/session", Some(&pair.access_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"authenticated": true, "user_id": "u1"}));
}

#[tokio::test]
async fn refresh_rotates_pair() {
    let app = app();
    let pair = login(&app).await;

    let (status, body) = send(
        &app,
        post_json("/auth/refresh", &json!({"refresh_token": pair.refresh_token})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let rotated: TokenPair = serde_json::from_value(body).unwrap();
    let (status, body) = send(&app, get("/auth/user", Some(&rotated.access_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "u1");
}

#[tokio::test]
async fn refresh_rejects_access_token() {
    let app = app();
    let pair = login(&app).await;

    let (status, body) = send(
        &app,
        post_json("/auth/refresh", &json!({"refresh_token": pair.access_token})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid token");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn refresh_with_foreign_secret_fails() {
    let other = TokenManager::new(&JwtConfig::new("some-other-secret-at-least-32-bytes")).unwrap();
    let pair = other.issue_pair("u1", "a@b.com", "authenticated").unwrap();

    let (status, _) = send(
        &app(),
        post_json("/auth/refresh", &json!({"refresh_token": pair.refresh_token})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_acknowledges() {
    let (status, body) = send(&app(), post_json("/auth/logout", &json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "logged out");
}
