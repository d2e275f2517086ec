//! Authentication route handlers: register, login, logout, profile update.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use sliceworks_core::{Email, Role, RoleSet, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::error::{ApiError, Result};
use crate::middleware::{BearerToken, RequireAuth};
use crate::models::{User, has_role};
use crate::services::password::{hash_password, verify_password};
use crate::services::session::SessionManager;
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Registration request body.
///
/// Fields are optional so missing values surface as a 400 validation
/// failure rather than a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Profile update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Successful registration/login response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// Simple message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /auth - Register a new user.
///
/// New users get the Diner role and an immediately valid session token.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    let (Some(name), Some(email), Some(password)) = (body.name, body.email, body.password) else {
        tracing::warn!("registration rejected: missing fields");
        return Err(ApiError::Validation(
            "name, email, and password are required".to_string(),
        ));
    };

    if name.is_empty() || password.is_empty() {
        return Err(ApiError::Validation(
            "name, email, and password are required".to_string(),
        ));
    }

    let email = Email::parse(&email)?;
    let password_hash = hash_password(&password)?;

    let users = UserRepository::new(state.pool());
    let user = users
        .create(&name, &email, &password_hash, RoleSet::single(Role::Diner))
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                ApiError::Validation("email already registered".to_string())
            }
            other => ApiError::Storage(other),
        })?;

    let sessions = SessionManager::new(state.pool(), state.session_keys());
    let token = sessions.issue(&user).await?;

    state.telemetry().record_auth(true);
    state.telemetry().session_opened();
    tracing::info!(user_id = %user.id, email = %user.email, "user registered");

    Ok(Json(AuthResponse { user, token }))
}

/// PUT /auth - Login an existing user.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let email = Email::parse(&body.email)?;

    let users = UserRepository::new(state.pool());
    let found = users.get_auth_parts(&email).await?;

    let authenticated = found.and_then(|(user, stored_hash)| {
        verify_password(&body.password, &stored_hash).then_some(user)
    });

    let Some(user) = authenticated else {
        state.telemetry().record_auth(false);
        tracing::warn!(email = %email, "login failed");
        return Err(ApiError::Authentication("Invalid credentials".to_string()));
    };

    let sessions = SessionManager::new(state.pool(), state.session_keys());
    let token = sessions.issue(&user).await?;

    state.telemetry().record_auth(true);
    state.telemetry().session_opened();
    tracing::info!(user_id = %user.id, email = %user.email, "login success");

    Ok(Json(AuthResponse { user, token }))
}

/// DELETE /auth - Logout: revoke the presented token.
///
/// Revocation is idempotent at the store level, but the request itself must
/// carry a currently valid session.
pub async fn logout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    BearerToken(token): BearerToken,
) -> Result<Json<MessageResponse>> {
    let sessions = SessionManager::new(state.pool(), state.session_keys());
    sessions.revoke(&token).await?;

    state.telemetry().session_closed();
    tracing::info!(user_id = %user.id, "logout success");

    Ok(Json(MessageResponse {
        message: "logout successful".to_string(),
    }))
}

/// PUT /auth/{userId} - Update a user's profile.
///
/// Permitted for the user themselves or an admin (self-or-admin).
pub async fn update_user(
    State(state): State<AppState>,
    RequireAuth(actor): RequireAuth,
    Path(user_id): Path<i64>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    let target = UserId::new(user_id);

    if actor.id != target && !has_role(&actor, Role::Admin) {
        state.telemetry().record_auth(false);
        tracing::warn!(
            user_id = %target,
            requester_id = %actor.id,
            "user update unauthorized"
        );
        return Err(ApiError::Authorization("unauthorized".to_string()));
    }

    state.telemetry().record_auth(true);

    let email = match &body.email {
        Some(e) => Some(Email::parse(e)?),
        None => None,
    };
    let password_hash = match &body.password {
        Some(p) => Some(hash_password(p)?),
        None => None,
    };

    let users = UserRepository::new(state.pool());
    let updated = users
        .update(
            target,
            body.name.as_deref(),
            email.as_ref(),
            password_hash.as_deref(),
        )
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => ApiError::NotFound("unknown user".to_string()),
            RepositoryError::Conflict(_) => {
                ApiError::Validation("email already registered".to_string())
            }
            other => ApiError::Storage(other),
        })?;

    tracing::info!(user_id = %target, requester_id = %actor.id, "user updated");

    Ok(Json(updated))
}
