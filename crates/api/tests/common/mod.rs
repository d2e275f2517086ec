//! Shared test harness: an in-memory service instance with a recording
//! telemetry sink, plus a stub factory that can be spawned per test.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::{Json, Router, routing::post};
use secrecy::SecretString;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

use sliceworks_api::config::{ApiConfig, FactoryConfig, TelemetryConfig};
use sliceworks_api::state::AppState;
use sliceworks_api::telemetry::{RecordingSink, Telemetry, TelemetrySink};
use sliceworks_api::{db, middleware, routes};

/// Signing secret shared by every test instance.
pub const JWT_SECRET: &str = "0123456789abcdef0123456789abcdef";

/// A service instance under test.
pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    pub telemetry: Arc<Telemetry>,
    pub sink: Arc<RecordingSink>,
}

/// Build a config pointing at the given factory URL.
#[allow(dead_code)]
pub fn test_config(factory_url: &str) -> ApiConfig {
    ApiConfig {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".parse().expect("valid host"),
        port: 0,
        jwt_secret: SecretString::from(JWT_SECRET),
        factory: FactoryConfig {
            url: factory_url.to_string(),
            api_key: SecretString::from("test-factory-key"),
            timeout: Duration::from_secs(2),
        },
        telemetry: TelemetryConfig {
            url: None,
            api_key: None,
            source: "test".to_string(),
            flush_interval: Duration::from_secs(10),
        },
    }
}

/// Spin up a full service instance backed by in-memory `SQLite`.
#[allow(dead_code)]
pub async fn setup(factory_url: &str) -> TestApp {
    let pool = db::create_pool("sqlite::memory:")
        .await
        .expect("Failed to create pool");
    db::MIGRATOR.run(&pool).await.expect("Failed to migrate");

    let sink = Arc::new(RecordingSink::new());
    let telemetry = Arc::new(Telemetry::new(
        "test",
        Arc::clone(&sink) as Arc<dyn TelemetrySink>,
    ));

    let state = AppState::new(test_config(factory_url), pool.clone(), Arc::clone(&telemetry))
        .expect("Failed to build state");

    let app = Router::new()
        .merge(routes::router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::track_requests,
        ))
        .with_state(state);

    TestApp {
        app,
        pool,
        telemetry,
        sink,
    }
}

/// Send a JSON request to the app and return (status, parsed body).
#[allow(dead_code)]
pub async fn send(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .expect("valid request"),
        None => builder.body(Body::empty()).expect("valid request"),
    };

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("request should not fail at the transport level");
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };

    (status, value)
}

/// Register a new diner and return (user, token).
#[allow(dead_code)]
pub async fn register(app: &Router, name: &str, email: &str, password: &str) -> (Value, String) {
    let (status, body) = send(
        app,
        "POST",
        "/auth",
        None,
        Some(serde_json::json!({"name": name, "email": email, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "registration failed: {body}");

    let token = body["token"].as_str().expect("token present").to_string();
    (body["user"].clone(), token)
}

/// Create an admin user directly in the database and log them in.
#[allow(dead_code)]
pub async fn create_admin(test_app: &TestApp, email: &str) -> String {
    use sliceworks_api::db::users::UserRepository;
    use sliceworks_api::services::password::hash_password;
    use sliceworks_core::{Email, Role, RoleSet};

    let users = UserRepository::new(&test_app.pool);
    let hash = hash_password("toomanysecrets").expect("hashable");
    users
        .create(
            "admin",
            &Email::parse(email).expect("valid email"),
            &hash,
            RoleSet::single(Role::Admin),
        )
        .await
        .expect("admin created");

    let (status, body) = send(
        &test_app.app,
        "PUT",
        "/auth",
        None,
        Some(serde_json::json!({"email": email, "password": "toomanysecrets"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "admin login failed: {body}");

    body["token"].as_str().expect("token present").to_string()
}

/// Spawn a stub factory returning a fixed response, and return its base URL.
#[allow(dead_code)]
pub async fn spawn_factory(status: StatusCode, body: Value) -> String {
    let handler = move || {
        let body = body.clone();
        async move { (status, Json(body)) }
    };

    let app = Router::new().route("/order", post(handler));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bindable port");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    format!("http://{addr}")
}

/// A base URL nothing listens on, for the unreachable path.
#[allow(dead_code)]
pub fn unreachable_factory_url() -> String {
    // Bind to an ephemeral port, then release it.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bindable port");
    let addr: SocketAddr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}
