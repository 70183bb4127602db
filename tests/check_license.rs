//! Tests for POST /check-license, the integrator-facing verification endpoint.

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

mod common;
use common::*;

fn body(key: &str, product: &str, account: &str) -> String {
    json!({ "licenseKey": key, "productName": product, "accountNumber": account }).to_string()
}

/// Owner, "Widget", consumer "ACC-1" and one trial license.
fn seed_widget(env: &TestEnv) -> (User, License) {
    let conn = env.conn();
    let user = create_test_user(&conn, "owner@example.com");
    let product = create_test_product(&conn, &user, "Widget");
    let consumer = create_test_consumer(&conn, &user, "Acme", "ACC-1");
    let license = create_test_license(&conn, &user, &product, &consumer, LicenseType::Trial, None);
    (user, license)
}

#[tokio::test]
async fn test_missing_secret_is_unauthorized() {
    let env = create_test_env();
    let (_, license) = seed_widget(&env);

    let (status, body) = send(
        env.app(),
        check_license_request(None, &body(&license.license_key, "Widget", "ACC-1")),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn test_wrong_secret_rejected_before_body_parsing() {
    let env = create_test_env();

    let (status, _) = send(env.app(), check_license_request(Some("nope"), "{not json")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_json_is_bad_request() {
    let env = create_test_env();

    let (status, body) = send(
        env.app(),
        check_license_request(Some(TEST_API_SECRET), "{not json"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON format");
}

#[tokio::test]
async fn test_missing_fields_is_bad_request() {
    let env = create_test_env();

    let (status, body) = send(
        env.app(),
        check_license_request(
            Some(TEST_API_SECRET),
            &json!({ "licenseKey": "abc", "productName": "Widget" }).to_string(),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");
}

#[tokio::test]
async fn test_reason_ordering_over_http() {
    let env = create_test_env();
    let (_, license) = seed_widget(&env);
    let key = license.license_key.as_str();

    let cases = [
        (body(key, "Widget", "ACC-999"), "License not found"),
        (body(key, "Gizmo", "ACC-1"), "Invalid product"),
        (body("not-the-key", "Widget", "ACC-1"), "License not found"),
    ];

    for (request, expected) in cases {
        let (status, body) =
            send(env.app(), check_license_request(Some(TEST_API_SECRET), &request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "invalid", "error": expected }));
    }
}

#[tokio::test]
async fn test_valid_license_response_shape() {
    let env = create_test_env();
    let expires = Utc::now() + Duration::days(30);
    let license = {
        let conn = env.conn();
        let user = create_test_user(&conn, "owner@example.com");
        let product = create_test_product(&conn, &user, "Widget");
        let consumer = create_test_consumer(&conn, &user, "Acme", "ACC-1");
        create_test_license(&conn, &user, &product, &consumer, LicenseType::Full, Some(expires))
    };

    let (status, body) = send(
        env.app(),
        check_license_request(
            Some(TEST_API_SECRET),
            &body(&license.license_key, "Widget", "ACC-1"),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "valid");
    assert_eq!(body["product"], "Widget");
    assert_eq!(body["active"], true);
    let returned = body["expires"].as_str().unwrap();
    assert!(returned.ends_with('Z'));
    assert_eq!(
        chrono::DateTime::parse_from_rfc3339(returned)
            .unwrap()
            .timestamp_millis(),
        expires.timestamp_millis()
    );
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_verification_is_deterministic() {
    let env = create_test_env();
    let (_, license) = seed_widget(&env);
    let request = body(&license.license_key, "Widget", "ACC-1");

    let (_, first) = send(env.app(), check_license_request(Some(TEST_API_SECRET), &request)).await;
    for _ in 0..3 {
        let (_, again) =
            send(env.app(), check_license_request(Some(TEST_API_SECRET), &request)).await;
        assert_eq!(again, first);
    }
}

/// Widget / ACC-1 walk-through: valid, deactivated, then expired.
#[tokio::test]
async fn test_widget_lifecycle_scenario() {
    let env = create_test_env();
    let token = {
        let conn = env.conn();
        let (_, token) = create_signed_in_user(&conn, "owner@example.com");
        token
    };
    let token = Some(token.as_str());

    let (status, product) = send(
        env.app(),
        json_request("POST", "/products", token, &json!({ "name": "Widget" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, consumer) = send(
        env.app(),
        json_request(
            "POST",
            "/consumers",
            token,
            &json!({ "name": "Acme", "email": "ops@acme.test", "accountNumber": "ACC-1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, license) = send(
        env.app(),
        json_request(
            "POST",
            "/licenses",
            token,
            &json!({
                "productId": product["id"],
                "consumerId": consumer["id"],
                "licenseType": "trial",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(license["active"], true);
    let key = license["licenseKey"].as_str().unwrap().to_string();
    let license_id = license["id"].clone();
    let verify = body(&key, "Widget", "ACC-1");

    let (_, result) = send(env.app(), check_license_request(Some(TEST_API_SECRET), &verify)).await;
    assert_eq!(result["status"], "valid");

    let (status, _) = send(
        env.app(),
        json_request(
            "POST",
            "/licenses/toggle",
            token,
            &json!({ "licenseId": license_id, "active": false }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, result) = send(env.app(), check_license_request(Some(TEST_API_SECRET), &verify)).await;
    assert_eq!(result, json!({ "status": "invalid", "error": "License deactivated" }));

    send(
        env.app(),
        json_request(
            "POST",
            "/licenses/toggle",
            token,
            &json!({ "licenseId": license_id, "active": true }),
        ),
    )
    .await;
    let (status, updated) = send(
        env.app(),
        json_request(
            "POST",
            "/licenses/expiry",
            token,
            &json!({ "licenseId": license_id, "expires": "2001-01-01T00:00:00Z" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["expires"], "2001-01-01T00:00:00.000Z");
    assert_eq!(updated["active"], true);

    let (_, result) = send(env.app(), check_license_request(Some(TEST_API_SECRET), &verify)).await;
    assert_eq!(result, json!({ "status": "invalid", "error": "License expired" }));
}

#[tokio::test]
async fn test_unset_secret_rejects_everything() {
    let env = create_test_env();
    let (_, license) = seed_widget(&env);
    let mut state = env.state.clone();
    state.api_secret = None;
    let app = licensehub::app(state, false);

    let (status, _) = send(
        app,
        check_license_request(
            Some(TEST_API_SECRET),
            &body(&license.license_key, "Widget", "ACC-1"),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_padded_values_do_not_match() {
    let env = create_test_env();
    let (_, license) = seed_widget(&env);

    let (status, body) = send(
        env.app(),
        check_license_request(
            Some(TEST_API_SECRET),
            &body(&format!(" {} ", license.license_key), " Widget ", " ACC-1 "),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "invalid", "error": "License not found" }));
}
