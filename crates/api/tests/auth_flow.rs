//! Session lifecycle tests: issuance, validation, revocation, and the
//! self-or-admin ownership rule.

mod common;

use axum::http::StatusCode;
use secrecy::SecretString;
use serde_json::json;

use common::{JWT_SECRET, create_admin, register, send, setup, unreachable_factory_url};
use sliceworks_api::services::session::{SessionKeys, SessionManager};

#[tokio::test]
async fn issued_token_validates_until_revoked() {
    let test_app = setup(&unreachable_factory_url()).await;

    let (_user, token) = register(&test_app.app, "pizza diner", "d@test.com", "diner").await;

    // The freshly issued token authenticates immediately.
    let (status, _) = send(&test_app.app, "GET", "/order", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    // Logout revokes it.
    let (status, body) = send(&test_app.app, "DELETE", "/auth", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "logout successful");

    // The same token now fails authentication.
    let (status, _) = send(&test_app.app, "GET", "/order", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn revoking_twice_is_a_no_op() {
    let test_app = setup(&unreachable_factory_url()).await;

    let (_user, token) = register(&test_app.app, "pizza diner", "d@test.com", "diner").await;

    let keys = SessionKeys::new(&SecretString::from(JWT_SECRET));
    let sessions = SessionManager::new(&test_app.pool, &keys);

    sessions.revoke(&token).await.expect("first revoke succeeds");
    sessions
        .revoke(&token)
        .await
        .expect("second revoke is a no-op, not an error");

    assert!(sessions.validate(&token).await.expect("store reachable").is_none());
}

#[tokio::test]
async fn tampered_signature_is_invalid() {
    let test_app = setup(&unreachable_factory_url()).await;

    let (_user, token) = register(&test_app.app, "pizza diner", "d@test.com", "diner").await;

    // Corrupt the signature segment; the token still parses structurally.
    let mut tampered = token[..token.len() - 4].to_string();
    tampered.push_str("AAAA");
    assert_ne!(tampered, token);

    let (status, _) = send(&test_app.app, "GET", "/order", Some(&tampered), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn well_signed_but_unstored_token_is_invalid() {
    let test_app = setup(&unreachable_factory_url()).await;
    register(&test_app.app, "pizza diner", "d@test.com", "diner").await;

    // Sign claims with the real process secret, but never record the token
    // in the credential store.
    #[derive(serde::Serialize)]
    struct ForgedClaims {
        sub: i64,
        name: String,
        email: String,
        roles: Vec<String>,
        iat: i64,
    }

    let forged = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &ForgedClaims {
            sub: 1,
            name: "pizza diner".to_string(),
            email: "d@test.com".to_string(),
            roles: vec!["diner".to_string()],
            iat: 0,
        },
        &jsonwebtoken::EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("encodable");

    let (status, _) = send(&test_app.app, "GET", "/order", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_requires_all_fields() {
    let test_app = setup(&unreachable_factory_url()).await;

    let (status, body) = send(
        &test_app.app,
        "POST",
        "/auth",
        None,
        Some(json!({"name": "no credentials"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "name, email, and password are required");
}

#[tokio::test]
async fn login_with_wrong_password_fails() {
    let test_app = setup(&unreachable_factory_url()).await;
    register(&test_app.app, "pizza diner", "d@test.com", "diner").await;

    let (status, body) = send(
        &test_app.app,
        "PUT",
        "/auth",
        None,
        Some(json!({"email": "d@test.com", "password": "wrong"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");

    // The failed attempt is counted.
    test_app.telemetry.flush().await;
    let lines = test_app.sink.lines();
    assert!(lines.iter().any(|l| l.starts_with("auth,source=test failure=")));
}

#[tokio::test]
async fn update_user_is_self_or_admin() {
    let test_app = setup(&unreachable_factory_url()).await;

    let (_user_a, token_a) = register(&test_app.app, "user a", "a@test.com", "secret-a").await;
    let (user_b, _token_b) = register(&test_app.app, "user b", "b@test.com", "secret-b").await;
    let b_id = user_b["id"].as_i64().expect("user id");

    // A updating B without the Admin role is forbidden.
    let (status, _) = send(
        &test_app.app,
        "PUT",
        &format!("/auth/{b_id}"),
        Some(&token_a),
        Some(json!({"email": "b-new@test.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // An admin may update anyone.
    let admin_token = create_admin(&test_app, "admin@test.com").await;
    let (status, body) = send(
        &test_app.app,
        "PUT",
        &format!("/auth/{b_id}"),
        Some(&admin_token),
        Some(json!({"email": "b-new@test.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "b-new@test.com");

    // Users may update themselves.
    let (status, body) = send(
        &test_app.app,
        "PUT",
        &format!("/auth/{}", _user_a["id"].as_i64().expect("user id")),
        Some(&token_a),
        Some(json!({"name": "renamed a"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "renamed a");
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let test_app = setup(&unreachable_factory_url()).await;

    register(&test_app.app, "pizza diner", "d@test.com", "diner").await;

    let (status, _) = send(
        &test_app.app,
        "POST",
        "/auth",
        None,
        Some(json!({"name": "again", "email": "d@test.com", "password": "diner"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
