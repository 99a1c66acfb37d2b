//! Integration tests for the auth endpoints.
//!
//! The router runs against an in-memory credential repository, so no
//! database is required.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    middleware,
    response::Response,
    routing::get,
    Extension, Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use wellness_auth::api::middleware::{auth_middleware, CurrentUser};
use wellness_auth::api::{create_router, AppState};
use wellness_auth::config::{Config, MSG_USERNAME_TAKEN};
use wellness_auth::domain::{Credential, NewCredential};
use wellness_auth::errors::{AppError, AppResult};
use wellness_auth::infra::CredentialRepository;

const SECRET: &str = "integration-test-secret-32-bytes!!";

// =============================================================================
// In-memory credential store
// =============================================================================

#[derive(Default)]
struct InMemoryCredentials {
    rows: Mutex<HashMap<String, Credential>>,
}

impl InMemoryCredentials {
    fn stored_hash(&self, username: &str) -> Option<String> {
        self.rows
            .lock()
            .unwrap()
            .get(username)
            .map(|c| c.password_hash.as_str().to_string())
    }

    fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentials {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Credential>> {
        Ok(self.rows.lock().unwrap().get(username).cloned())
    }

    async fn insert(&self, credential: NewCredential) -> AppResult<Credential> {
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&credential.username) {
            return Err(AppError::conflict(MSG_USERNAME_TAKEN));
        }
        let stored = credential.with_id(rows.len() as i64 + 1);
        rows.insert(stored.username.clone(), stored.clone());
        Ok(stored)
    }
}

// =============================================================================
// Test Helpers
// =============================================================================

fn test_app() -> (Router, AppState, Arc<InMemoryCredentials>) {
    let store = Arc::new(InMemoryCredentials::default());
    let state = AppState::with_repository(
        store.clone(),
        &Config::with_secret(Some(SECRET.to_string())),
    );
    (create_router(state.clone()), state, store)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_bytes(response).await)
}

async fn register(app: &Router, username: &str, password: &str) -> (StatusCode, Vec<u8>) {
    send(
        app,
        post_json(
            "/api/auth/register",
            json!({ "username": username, "password": password }),
        ),
    )
    .await
}

async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, Vec<u8>) {
    send(
        app,
        post_json(
            "/api/auth/login",
            json!({ "username": username, "password": password }),
        ),
    )
    .await
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_register_returns_empty_ok() {
    let (app, _, store) = test_app();

    let (status, body) = register(&app, "alice", "pw1").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_register_stores_hash_not_plaintext() {
    let (app, _, store) = test_app();

    register(&app, "alice", "pw1").await;

    let hash = store.stored_hash("alice").unwrap();
    assert_ne!(hash, "pw1");
    assert!(hash.starts_with("$argon2"));
}

#[tokio::test]
async fn test_duplicate_registration_rejected_and_first_kept() {
    let (app, _, store) = test_app();

    register(&app, "alice", "pw1").await;
    let first_hash = store.stored_hash("alice").unwrap();

    let (status, body) = register(&app, "alice", "pw2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"]["code"], "CONFLICT");
    assert_eq!(body["error"]["message"], MSG_USERNAME_TAKEN);

    assert_eq!(store.len(), 1);
    assert_eq!(store.stored_hash("alice").unwrap(), first_hash);

    let (status, _) = login(&app, "alice", "pw1").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = login(&app, "alice", "pw2").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_usernames_are_case_sensitive() {
    let (app, _, store) = test_app();

    register(&app, "alice", "pw1").await;
    let (status, _) = register(&app, "Alice", "pw1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_register_does_not_issue_token() {
    let (app, _, _) = test_app();

    let (_, body) = register(&app, "alice", "pw1").await;
    assert!(!String::from_utf8(body).unwrap().contains("token"));
}

#[tokio::test]
async fn test_register_empty_username_is_validation_error() {
    let (app, _, store) = test_app();

    let (status, body) = register(&app, "", "pw1").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn test_register_missing_field_is_validation_error() {
    let (app, _, _) = test_app();

    let (status, _) = send(
        &app,
        post_json("/api/auth/register", json!({ "username": "alice" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_accepts_empty_password() {
    let (app, _, store) = test_app();

    let (status, body) = register(&app, "bob", "").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert_eq!(store.len(), 1);

    let (status, _) = login(&app, "bob", "").await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_returns_token_for_subject() {
    let (app, state, _) = test_app();

    register(&app, "alice", "pw1").await;
    let (status, body) = login(&app, "alice", "pw1").await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    let token = body["token"].as_str().unwrap();

    let claims = state.token_service.validate(token).unwrap();
    assert_eq!(claims.sub, "alice");
    assert_eq!(claims.exp - claims.iat, 24 * 3600);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let (app, _, _) = test_app();

    register(&app, "alice", "pw1").await;
    let (wrong_status, wrong_body) = login(&app, "alice", "wrong").await;
    let (unknown_status, unknown_body) = login(&app, "nonexistent", "anything").await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);

    let body: Value = serde_json::from_slice(&wrong_body).unwrap();
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
    assert_eq!(body["error"]["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_empty_fields_are_invalid_credentials() {
    let (app, _, _) = test_app();

    register(&app, "alice", "pw1").await;
    let (_, unknown_body) = login(&app, "nonexistent", "anything").await;

    for (username, password) in [("", "x"), ("alice", ""), ("", "")] {
        let (status, body) = login(&app, username, password).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, unknown_body);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (app, _, _) = test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let (app, _, _) = test_app();

    let request = Request::builder()
        .uri("/api-docs/openapi.json")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    let doc: Value = serde_json::from_slice(&body).unwrap();
    assert!(doc["paths"]["/api/auth/login"].is_object());
}

// =============================================================================
// Bearer token middleware
// =============================================================================

async fn whoami(Extension(user): Extension<CurrentUser>) -> String {
    user.username
}

fn protected_app(state: AppState) -> Router {
    Router::new()
        .route("/me", get(whoami))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

fn get_with_auth(uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_protected_route_accepts_valid_token() {
    let (_, state, _) = test_app();
    let token = state.token_service.issue("alice").unwrap();
    let app = protected_app(state);

    let (status, body) = send(
        &app,
        get_with_auth("/me", Some(&format!("Bearer {}", token))),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"alice");
}

#[tokio::test]
async fn test_protected_route_requires_header() {
    let (_, state, _) = test_app();
    let app = protected_app(state);

    let (status, body) = send(&app, get_with_auth("/me", None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_protected_route_rejects_tampered_token() {
    let (_, state, _) = test_app();
    let token = state.token_service.issue("alice").unwrap();
    let (head, signature) = token.rsplit_once('.').unwrap();
    let flipped = if signature.starts_with('A') { "B" } else { "A" };
    let tampered = format!("{}.{}{}", head, flipped, &signature[1..]);
    let app = protected_app(state);

    let (status, body) = send(
        &app,
        get_with_auth("/me", Some(&format!("Bearer {}", tampered))),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_protected_route_rejects_token_from_other_instance() {
    let (_, issuer, _) = test_app();
    let token = issuer.token_service.issue("alice").unwrap();

    let other = AppState::with_repository(
        Arc::new(InMemoryCredentials::default()),
        &Config::with_secret(None),
    );
    let app = protected_app(other);

    let (status, _) = send(
        &app,
        get_with_auth("/me", Some(&format!("Bearer {}", token))),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
