//! Franchise tests: creation authorization, store ownership, and cascade
//! deletion semantics.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{create_admin, register, send, setup, unreachable_factory_url};

#[tokio::test]
async fn franchise_creation_is_admin_only() {
    let test_app = setup(&unreachable_factory_url()).await;

    let (_user, diner_token) = register(&test_app.app, "diner", "d@test.com", "diner").await;

    let (status, _) = send(
        &test_app.app,
        "POST",
        "/franchise",
        Some(&diner_token),
        Some(json!({"name": "SliceCo", "admins": []})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn franchise_admin_gets_franchisee_role_and_store_rights() {
    let test_app = setup(&unreachable_factory_url()).await;

    let (operator, operator_token) =
        register(&test_app.app, "operator", "op@test.com", "secret").await;
    let admin_token = create_admin(&test_app, "admin@test.com").await;

    let (status, franchise) = send(
        &test_app.app,
        "POST",
        "/franchise",
        Some(&admin_token),
        Some(json!({"name": "SliceCo", "admins": [{"email": "op@test.com"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(franchise["name"], "SliceCo");
    assert_eq!(franchise["admins"][0]["email"], "op@test.com");
    let franchise_id = franchise["id"].as_i64().expect("franchise id");

    // The operator now administers the franchise and can create stores.
    let (status, store) = send(
        &test_app.app,
        "POST",
        &format!("/franchise/{franchise_id}/store"),
        Some(&operator_token),
        Some(json!({"name": "Downtown"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store["name"], "Downtown");

    // A plain diner cannot.
    let (_diner, diner_token) = register(&test_app.app, "diner", "d@test.com", "diner").await;
    let (status, _) = send(
        &test_app.app,
        "POST",
        &format!("/franchise/{franchise_id}/store"),
        Some(&diner_token),
        Some(json!({"name": "Uptown"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The operator sees their franchise under their own user id.
    let operator_id = operator["id"].as_i64().expect("user id");
    let (status, listed) = send(
        &test_app.app,
        "GET",
        &format!("/franchise/{operator_id}"),
        Some(&operator_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    // Another user cannot read the operator's franchises.
    let (status, _) = send(
        &test_app.app,
        "GET",
        &format!("/franchise/{operator_id}"),
        Some(&diner_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_franchise_admin_email_is_not_found() {
    let test_app = setup(&unreachable_factory_url()).await;
    let admin_token = create_admin(&test_app, "admin@test.com").await;

    let (status, _) = send(
        &test_app.app,
        "POST",
        "/franchise",
        Some(&admin_token),
        Some(json!({"name": "SliceCo", "admins": [{"email": "ghost@test.com"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Nothing was created.
    let (_, franchises) = send(&test_app.app, "GET", "/franchise", None, None).await;
    assert_eq!(franchises.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn franchise_deletion_cascades_to_stores_and_is_not_idempotent() {
    let test_app = setup(&unreachable_factory_url()).await;
    let admin_token = create_admin(&test_app, "admin@test.com").await;

    let (_, franchise) = send(
        &test_app.app,
        "POST",
        "/franchise",
        Some(&admin_token),
        Some(json!({"name": "SliceCo", "admins": []})),
    )
    .await;
    let franchise_id = franchise["id"].as_i64().expect("franchise id");

    send(
        &test_app.app,
        "POST",
        &format!("/franchise/{franchise_id}/store"),
        Some(&admin_token),
        Some(json!({"name": "Downtown"})),
    )
    .await;

    let (status, body) = send(
        &test_app.app,
        "DELETE",
        &format!("/franchise/{franchise_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "franchise deleted");

    // No orphan store rows survive the cascade.
    let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM store WHERE franchise_id = ?")
        .bind(franchise_id)
        .fetch_one(&test_app.pool)
        .await
        .expect("countable");
    assert_eq!(orphans, 0);

    // Deleting an already-deleted franchise is a not-found outcome.
    let (status, _) = send(
        &test_app.app,
        "DELETE",
        &format!("/franchise/{franchise_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn store_deletion_is_scoped_and_not_idempotent() {
    let test_app = setup(&unreachable_factory_url()).await;
    let admin_token = create_admin(&test_app, "admin@test.com").await;

    let (_, franchise) = send(
        &test_app.app,
        "POST",
        "/franchise",
        Some(&admin_token),
        Some(json!({"name": "SliceCo", "admins": []})),
    )
    .await;
    let franchise_id = franchise["id"].as_i64().expect("franchise id");

    let (_, store) = send(
        &test_app.app,
        "POST",
        &format!("/franchise/{franchise_id}/store"),
        Some(&admin_token),
        Some(json!({"name": "Downtown"})),
    )
    .await;
    let store_id = store["id"].as_i64().expect("store id");

    let (status, body) = send(
        &test_app.app,
        "DELETE",
        &format!("/franchise/{franchise_id}/store/{store_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "store deleted");

    let (status, _) = send(
        &test_app.app,
        "DELETE",
        &format!("/franchise/{franchise_id}/store/{store_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn franchise_listing_is_public() {
    let test_app = setup(&unreachable_factory_url()).await;

    let (status, franchises) = send(&test_app.app, "GET", "/franchise", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(franchises.as_array().map(Vec::len), Some(0));
}
