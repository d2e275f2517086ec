//! Integration tests against a running Sliceworks service.
//!
//! These tests require:
//! - A running service (cargo run -p sliceworks-api)
//! - A migrated database (sw-cli migrate)
//!
//! Run with: cargo test -p sliceworks-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

/// Base URL for the service (configurable via environment).
fn base_url() -> String {
    std::env::var("SLICEWORKS_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A unique email per test run so registration never collides.
fn unique_email(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock after epoch")
        .as_nanos();
    format!("{prefix}-{nanos}@test.com")
}

/// Register a fresh diner and return (user, token).
async fn register(client: &Client, email: &str) -> (Value, String) {
    let resp = client
        .post(format!("{}/auth", base_url()))
        .json(&json!({"name": "integration diner", "email": email, "password": "diner"}))
        .send()
        .await
        .expect("service reachable");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("JSON body");
    let token = body["token"].as_str().expect("token present").to_string();
    (body["user"].clone(), token)
}

#[tokio::test]
#[ignore = "Requires a running service"]
async fn test_health_endpoints() {
    let client = Client::new();

    let resp = client
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("service reachable");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{}/health/ready", base_url()))
        .send()
        .await
        .expect("service reachable");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires a running service"]
async fn test_register_login_logout_cycle() {
    let client = Client::new();
    let email = unique_email("cycle");

    let (_user, token) = register(&client, &email).await;

    // Login issues a second concurrent session.
    let resp = client
        .put(format!("{}/auth", base_url()))
        .json(&json!({"email": email, "password": "diner"}))
        .send()
        .await
        .expect("service reachable");
    assert_eq!(resp.status(), StatusCode::OK);

    // Logout revokes the first token; it no longer authenticates.
    let resp = client
        .delete(format!("{}/auth", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("service reachable");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{}/order", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("service reachable");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires a running service"]
async fn test_menu_is_public() {
    let client = Client::new();

    let resp = client
        .get(format!("{}/order/menu", base_url()))
        .send()
        .await
        .expect("service reachable");

    assert_eq!(resp.status(), StatusCode::OK);
    let menu: Value = resp.json().await.expect("JSON body");
    assert!(menu.is_array());
}

#[tokio::test]
#[ignore = "Requires a running service and factory credentials"]
async fn test_order_placement() {
    let client = Client::new();
    let email = unique_email("order");
    let (_user, token) = register(&client, &email).await;

    let resp = client
        .post(format!("{}/order", base_url()))
        .bearer_auth(&token)
        .json(&json!({
            "franchiseId": 1,
            "storeId": 1,
            "items": [{"menuId": 1, "description": "Veggie", "price": 0.0038}]
        }))
        .send()
        .await
        .expect("service reachable");

    // Depending on factory availability this is 200 or 500, but the order
    // must exist afterward either way.
    let placed = resp.status() == StatusCode::OK;

    let resp = client
        .get(format!("{}/order", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("service reachable");
    assert_eq!(resp.status(), StatusCode::OK);

    let history: Value = resp.json().await.expect("JSON body");
    let orders = history["orders"].as_array().expect("orders array");
    assert_eq!(orders.len(), 1, "order must persist (fulfilled: {placed})");
}
