//! Registration, login, logout and the session guard on protected routes.

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

mod common;
use common::*;

#[tokio::test]
async fn test_protected_routes_require_session() {
    let env = create_test_env();

    for (method, uri) in [
        ("GET", "/products"),
        ("GET", "/consumers"),
        ("GET", "/licenses"),
        ("GET", "/auth/session"),
        ("POST", "/auth/logout"),
    ] {
        let (status, body) = send(env.app(), empty_request(method, uri, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(body, json!({ "error": "Unauthorized" }));
    }

    let (status, _) = send(env.app(), empty_request("GET", "/products", Some("bogus"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unauthorized_before_body_validation() {
    let env = create_test_env();

    let (status, _) = send(
        env.app(),
        json_request("POST", "/licenses", None, &json!({ "licenseType": "trial" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_login_logout_flow() {
    let env = create_test_env();
    let credentials = json!({ "email": "Owner@Example.com", "password": "hunter22" });

    let (status, user) = send(
        env.app(),
        json_request("POST", "/auth/register", None, &credentials),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], "owner@example.com");
    assert_eq!(user["role"], "admin");
    assert!(user.get("passwordHash").is_none());

    let (status, session) = send(
        env.app(),
        json_request("POST", "/auth/login", None, &credentials),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = session["token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 64);
    assert!(session["expiresAt"].as_str().unwrap().ends_with('Z'));

    let (status, current) = send(
        env.app(),
        empty_request("GET", "/auth/session", Some(token.as_str())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["user"]["id"], user["id"]);

    let (status, _) = send(env.app(), empty_request("POST", "/auth/logout", Some(token.as_str()))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(env.app(), empty_request("GET", "/products", Some(token.as_str()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let env = create_test_env();
    {
        let conn = env.conn();
        create_test_user(&conn, "owner@example.com");
    }

    let (status, body) = send(
        env.app(),
        json_request(
            "POST",
            "/auth/register",
            None,
            &json!({ "email": "owner@example.com", "password": "pw" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User already exists");
}

#[tokio::test]
async fn test_register_requires_credentials() {
    let env = create_test_env();

    let (status, _) = send(
        env.app(),
        json_request("POST", "/auth/register", None, &json!({ "email": "a@b.c" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_failures_are_uniform() {
    let env = create_test_env();
    licensehub::accounts::register(&env.state, "owner@example.com", "right-password")
        .await
        .unwrap();
    {
        // Federated account: no password at all
        let conn = env.conn();
        create_test_user(&conn, "federated@example.com");
    }

    for credentials in [
        json!({ "email": "owner@example.com", "password": "wrong-password" }),
        json!({ "email": "nobody@example.com", "password": "right-password" }),
        json!({ "email": "federated@example.com", "password": "anything" }),
    ] {
        let (status, body) = send(
            env.app(),
            json_request("POST", "/auth/login", None, &credentials),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Unauthorized" }));
    }
}

#[tokio::test]
async fn test_expired_session_is_rejected() {
    let env = create_test_env();
    let token = {
        let conn = env.conn();
        let user = create_test_user(&conn, "owner@example.com");
        let (session, token) = queries::create_session(&conn, &user.id, 1).unwrap();
        conn.execute(
            "UPDATE sessions SET expires_at = ?1 WHERE id = ?2",
            rusqlite::params![(Utc::now() - Duration::hours(1)).timestamp_millis(), session.id],
        )
        .unwrap();
        token
    };

    let (status, _) = send(env.app(), empty_request("GET", "/products", Some(token.as_str()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let conn = env.conn();
    assert_eq!(queries::purge_expired_sessions(&conn).unwrap(), 1);
}

#[tokio::test]
async fn test_health_is_public() {
    let env = create_test_env();

    let (status, body) = send(env.app(), empty_request("GET", "/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[test]
fn test_session_expiry_follows_ttl() {
    let env = create_test_env();
    let conn = env.conn();
    let user = create_test_user(&conn, "owner@example.com");

    let before = Utc::now();
    let (session, _token) = queries::create_session(&conn, &user.id, 24).unwrap();
    let ttl = session.expires_at - before;
    assert!(ttl <= Duration::hours(24) + Duration::seconds(1));
    assert!(ttl > Duration::hours(24) - Duration::minutes(1));
}

#[test]
fn test_session_ttl_out_of_range_is_an_error() {
    let env = create_test_env();
    let conn = env.conn();
    let user = create_test_user(&conn, "owner@example.com");

    let err = queries::create_session(&conn, &user.id, i64::MAX).unwrap_err();
    assert!(matches!(err, licensehub::error::AppError::Internal(_)));

    let stored: i64 = conn
        .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
        .unwrap();
    assert_eq!(stored, 0);
}
