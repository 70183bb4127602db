//! Shared fixtures for integration tests: a file-backed database per test,
//! direct seeding helpers, and request builders for the router.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub use licensehub::config::Config;
pub use licensehub::db::{AppState, create_pool, init_db, queries, scope::Owned};
pub use licensehub::models::*;

pub const TEST_API_SECRET: &str = "test-api-secret";

/// Keeps the temporary directory alive for as long as the state is in use.
pub struct TestEnv {
    pub state: AppState,
    _dir: TempDir,
}

impl TestEnv {
    pub fn conn(&self) -> r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager> {
        self.state.db.get().unwrap()
    }

    pub fn app(&self) -> Router {
        licensehub::app(self.state.clone(), false)
    }
}

pub fn test_config(database_path: &str) -> Config {
    Config {
        host: "127.0.0.1".into(),
        port: 0,
        database_path: database_path.into(),
        api_secret: Some(TEST_API_SECRET.into()),
        session_ttl_hours: 24,
        dev_mode: false,
    }
}

pub fn create_test_env() -> TestEnv {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("licensehub-test.db");
    let path = path.to_str().unwrap().to_string();

    let pool = create_pool(&path, 8).unwrap();
    init_db(&pool.get().unwrap()).unwrap();

    TestEnv {
        state: AppState::new(pool, &test_config(&path)),
        _dir: dir,
    }
}

// ============ Seeding ============

pub fn create_test_user(conn: &Connection, email: &str) -> User {
    queries::create_user(conn, email, None).unwrap()
}

/// Open a session for a user and return its bearer token.
pub fn create_test_session(conn: &Connection, user: &User) -> String {
    let (_session, token) = queries::create_session(conn, &user.id, 24).unwrap();
    token
}

/// A user plus a live session token.
pub fn create_signed_in_user(conn: &Connection, email: &str) -> (User, String) {
    let user = create_test_user(conn, email);
    let token = create_test_session(conn, &user);
    (user, token)
}

pub fn create_test_product(conn: &Connection, owner: &User, name: &str) -> Product {
    queries::create_product(conn, Owned::by(&owner.id), name, None).unwrap()
}

pub fn create_test_consumer(
    conn: &Connection,
    owner: &User,
    name: &str,
    account_number: &str,
) -> Consumer {
    let new = NewConsumer {
        name: name.into(),
        email: format!("{}@example.com", account_number.to_lowercase()),
        phone: None,
        country: None,
        account_number: account_number.into(),
    };
    queries::create_consumer(conn, Owned::by(&owner.id), &new).unwrap()
}

pub fn create_test_license(
    conn: &Connection,
    owner: &User,
    product: &Product,
    consumer: &Consumer,
    license_type: LicenseType,
    expires: Option<DateTime<Utc>>,
) -> License {
    queries::create_license(
        conn,
        Owned::by(&owner.id),
        &product.id,
        &consumer.id,
        license_type,
        expires,
    )
    .unwrap()
}

// ============ Requests ============

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn check_license_request(secret: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/check-license")
        .header("content-type", "application/json");
    if let Some(secret) = secret {
        builder = builder.header("x-api-secret", secret);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Send one request and decode the JSON body (Null when empty).
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
