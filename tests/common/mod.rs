//! Shared test harness: a router backed by a temp-file database and the
//! local HS256 verifier with a known secret.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use bookstack::auth::local::LocalClaims;
use bookstack::auth::{LocalVerifier, TokenVerifier};
use bookstack::config::{AuthStrategy, MutationPolicy};
use bookstack::crypto::hash_password;
use bookstack::db::{self, queries, AppState};

pub const TEST_SECRET: &str = "test-secret";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    // Keeps the database file alive for the test's duration.
    _dir: TempDir,
}

pub fn test_app(policy: MutationPolicy) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");
    let pool = db::init_pool(path.to_str().unwrap()).unwrap();
    db::init_schema(&pool.get().unwrap()).unwrap();

    let state = AppState {
        db: pool,
        verifier: Arc::new(TokenVerifier::Local(LocalVerifier::new(TEST_SECRET, 3600))),
        auth_strategy: AuthStrategy::Local,
        mutation_policy: policy,
        auth0: None,
        base_url: "http://127.0.0.1:3000".to_string(),
    };

    TestApp {
        router: bookstack::router(state.clone()),
        state,
        _dir: dir,
    }
}

/// Insert a user directly and return a token for them.
pub fn seed_user(app: &TestApp, username: &str, is_admin: bool) -> String {
    let conn = app.state.db.get().unwrap();
    let hash = hash_password("password123").unwrap();
    queries::create_user(
        &conn,
        username,
        &format!("{}@example.com", username),
        &hash,
        is_admin,
    )
    .unwrap();
    token_for(username)
}

pub fn token_for(subject: &str) -> String {
    LocalVerifier::new(TEST_SECRET, 3600).issue(subject).unwrap()
}

pub fn expired_token(subject: &str) -> String {
    use jsonwebtoken::{Algorithm, EncodingKey, Header};

    let now = chrono::Utc::now().timestamp();
    let claims = LocalClaims {
        sub: subject.to_string(),
        iat: now - 7200,
        // Far enough in the past to clear the default validation leeway.
        exp: now - 3600,
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Raw-header variant for malformed Authorization values.
pub fn request_with_auth_header(method: &str, uri: &str, auth_value: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", auth_value)
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap()
}

pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
