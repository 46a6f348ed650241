//! Integration tests for the session lifecycle
//!
//! These exercise the rotation protocol against a real database.
//! Run with a PostgreSQL instance at TEST_DATABASE_URL:
//! `cargo test -- --ignored`

mod common;

use axum::http::StatusCode;
use jobdeck_shared::Role;
use serde_json::json;

fn unique_email(prefix: &str) -> String {
    format!("{prefix}_{}@example.com", uuid::Uuid::new_v4())
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_register_then_login() {
    let app = common::TestApp::new().await;
    let email = unique_email("login");

    let session = app.register_contractor(&email, "SecurePassword1").await;
    assert!(!session["access_token"].as_str().unwrap().is_empty());
    assert!(!session["refresh_token"].as_str().unwrap().is_empty());
    assert_eq!(session["token_type"], "Bearer");
    assert_eq!(session["user"]["role"], "contractor");
    assert_eq!(session["user"]["role_key"], "contractor");

    let (status, body) = app
        .post(
            "/api/auth/login",
            &json!({ "email": email, "password": "SecurePassword1" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["access_token"].as_str().unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_login_wrong_password_is_bad_credentials() {
    let app = common::TestApp::new().await;
    let email = unique_email("badpw");
    app.register_contractor(&email, "SecurePassword1").await;

    let (status, body) = app
        .post(
            "/api/auth/login",
            &json!({ "email": email, "password": "WrongPassword1" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "BAD_CREDENTIALS");
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_unknown_email_and_wrong_password_are_indistinguishable() {
    let app = common::TestApp::new().await;
    let email = unique_email("enum");
    app.register_contractor(&email, "SecurePassword1").await;

    let (status_a, body_a) = app
        .post(
            "/api/auth/login",
            &json!({ "email": email, "password": "WrongPassword1" }),
            None,
        )
        .await;
    let (status_b, body_b) = app
        .post(
            "/api/auth/login",
            &json!({ "email": unique_email("noone"), "password": "WrongPassword1" }),
            None,
        )
        .await;

    assert_eq!(status_a, status_b);
    assert_eq!(body_a["error"]["code"], body_b["error"]["code"]);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_inactive_account_cannot_login_or_refresh() {
    let app = common::TestApp::new().await;
    let email = unique_email("inactive");
    let session = app.register_contractor(&email, "SecurePassword1").await;
    let refresh_token = session["refresh_token"].as_str().unwrap().to_string();

    app.deactivate_user(&email).await;

    let (status, body) = app
        .post(
            "/api/auth/login",
            &json!({ "email": email, "password": "SecurePassword1" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "ACCOUNT_INACTIVE");

    let (status, body) = app
        .post(
            "/api/auth/refresh",
            &json!({ "refresh_token": refresh_token }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "ACCOUNT_INACTIVE");

    // The rejected refresh still consumed the token.
    assert_eq!(app.refresh_token_count(&email).await, 0);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_refresh_rotates_and_replay_fails() {
    let app = common::TestApp::new().await;
    let email = unique_email("rotate");
    let session = app.register_contractor(&email, "SecurePassword1").await;
    let original = session["refresh_token"].as_str().unwrap().to_string();

    let (status, rotated) = app
        .post("/api/auth/refresh", &json!({ "refresh_token": original }), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let new_refresh = rotated["refresh_token"].as_str().unwrap();
    assert_ne!(new_refresh, original);

    // Replaying the consumed secret must always fail.
    let (status, body) = app
        .post("/api/auth/refresh", &json!({ "refresh_token": original }), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_REFRESH");

    // The rotated secret still works.
    let (status, _) = app
        .post("/api/auth/refresh", &json!({ "refresh_token": new_refresh }), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_concurrent_refresh_exactly_one_wins() {
    let app = common::TestApp::new().await;
    let email = unique_email("race");
    let session = app.register_contractor(&email, "SecurePassword1").await;
    let refresh_token = session["refresh_token"].as_str().unwrap().to_string();

    let body = json!({ "refresh_token": refresh_token });
    let (a, b) = tokio::join!(
        app.post("/api/auth/refresh", &body, None),
        app.post("/api/auth/refresh", &body, None),
    );

    let statuses = [a.0, b.0];
    let winners = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    let losers = statuses
        .iter()
        .filter(|s| **s == StatusCode::UNAUTHORIZED)
        .count();

    assert_eq!(winners, 1, "exactly one refresh must succeed: {statuses:?}");
    assert_eq!(losers, 1, "exactly one refresh must fail: {statuses:?}");

    let loser_body = if a.0 == StatusCode::UNAUTHORIZED { a.1 } else { b.1 };
    assert_eq!(loser_body["error"]["code"], "INVALID_REFRESH");
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_logout_is_idempotent_and_always_succeeds() {
    let app = common::TestApp::new().await;
    let email = unique_email("logout");
    let session = app.register_contractor(&email, "SecurePassword1").await;
    let access = session["access_token"].as_str().unwrap().to_string();
    let refresh = session["refresh_token"].as_str().unwrap().to_string();

    let (status, _) = app
        .post(
            "/api/auth/logout",
            &json!({ "refresh_token": refresh }),
            Some(&access),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Same token again: already gone, still 200.
    let (status, _) = app
        .post(
            "/api/auth/logout",
            &json!({ "refresh_token": refresh }),
            Some(&access),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Garbage token: still 200.
    let (status, _) = app
        .post(
            "/api/auth/logout",
            &json!({ "refresh_token": "never-issued" }),
            Some(&access),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // The consumed secret no longer refreshes.
    let (status, body) = app
        .post("/api/auth/refresh", &json!({ "refresh_token": refresh }), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_REFRESH");
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_change_password_revokes_all_sessions() {
    let app = common::TestApp::new().await;
    let email = unique_email("chpw");
    let session = app.register_contractor(&email, "SecurePassword1").await;
    let access = session["access_token"].as_str().unwrap().to_string();
    let device_one = session["refresh_token"].as_str().unwrap().to_string();

    // A second device logs in.
    let (status, second) = app
        .post(
            "/api/auth/login",
            &json!({ "email": email, "password": "SecurePassword1" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let device_two = second["refresh_token"].as_str().unwrap().to_string();
    assert_eq!(app.refresh_token_count(&email).await, 2);

    let (status, _) = app
        .post(
            "/api/auth/change-password",
            &json!({
                "current_password": "SecurePassword1",
                "new_password": "EvenMoreSecure2",
            }),
            Some(&access),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.refresh_token_count(&email).await, 0);

    // Every previously issued refresh token is dead.
    for stale in [device_one, device_two] {
        let (status, body) = app
            .post("/api/auth/refresh", &json!({ "refresh_token": stale }), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_REFRESH");
    }

    // A fresh login with the new password mints a working pair.
    let (status, fresh) = app
        .post(
            "/api/auth/login",
            &json!({ "email": email, "password": "EvenMoreSecure2" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .post(
            "/api/auth/refresh",
            &json!({ "refresh_token": fresh["refresh_token"].as_str().unwrap() }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_change_password_wrong_current_is_rejected() {
    let app = common::TestApp::new().await;
    let email = unique_email("chpw_wrong");
    let session = app.register_contractor(&email, "SecurePassword1").await;
    let access = session["access_token"].as_str().unwrap().to_string();

    let (status, body) = app
        .post(
            "/api/auth/change-password",
            &json!({
                "current_password": "NotTheCurrentOne",
                "new_password": "EvenMoreSecure2",
            }),
            Some(&access),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "BAD_CREDENTIALS");

    // Sessions were not revoked by a failed attempt.
    assert_eq!(app.refresh_token_count(&email).await, 1);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_expired_access_token_refresh_and_retry() {
    let app = common::TestApp::new().await;
    let email = unique_email("e2e");
    let session = app.register_contractor(&email, "SecurePassword1").await;
    let refresh_token = session["refresh_token"].as_str().unwrap().to_string();
    let user_id: uuid::Uuid = session["user"]["id"].as_str().unwrap().parse().unwrap();

    // Simulate the clock passing the access TTL.
    let expired_access = app
        .state
        .tokens()
        .issue_access_with_ttl(user_id, Role::Contractor, -60)
        .unwrap();

    let (status, body) = app.get("/api/auth/me", Some(&expired_access)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "TOKEN_EXPIRED");

    // Refresh with the stored secret, then retry the original call.
    let (status, rotated) = app
        .post(
            "/api/auth/refresh",
            &json!({ "refresh_token": refresh_token }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let new_access = rotated["access_token"].as_str().unwrap();
    let (status, profile) = app.get("/api/auth/me", Some(new_access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], email);
    assert_eq!(profile["role"], "contractor");
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_register_validation() {
    let app = common::TestApp::new().await;

    // Weak password
    let (status, body) = app
        .post(
            "/api/auth/register",
            &json!({
                "email": unique_email("weak"),
                "password": "short",
                "name": "Weak",
                "role": "contractor",
            }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "WEAK_PASSWORD");

    // Role outside the self-register allow-list
    let (status, _) = app
        .post(
            "/api/auth/register",
            &json!({
                "email": unique_email("role"),
                "password": "SecurePassword1",
                "name": "Nope",
                "role": "ccm_employee",
            }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Duplicate email
    let email = unique_email("dup");
    app.register_contractor(&email, "SecurePassword1").await;
    let (status, _) = app
        .post(
            "/api/auth/register",
            &json!({
                "email": email,
                "password": "SecurePassword1",
                "name": "Again",
                "role": "contractor",
            }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
