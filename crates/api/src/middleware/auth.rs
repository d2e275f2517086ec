//! Authentication middleware and extractors.
//!
//! The two-stage gate: [`OptionalIdentity`] is the authentication stage — it
//! resolves a bearer token to an identity if possible and never rejects, so
//! endpoints decide whether authentication is required. [`RequireAuth`] is
//! the requirement stage — it rejects with 401 when no identity resolved.
//! Ownership rules (self-or-admin) are enforced in the handlers that need
//! them; this layer touches no storage beyond the session lookup.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;
use crate::models::User;
use crate::services::session::SessionManager;
use crate::state::AppState;

/// Read the bearer token from the `Authorization` header, if any.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Extractor that resolves the bearer token to an identity if one is
/// present and valid. A missing, malformed, or revoked token leaves the
/// identity unset; only a credential-store failure rejects (500).
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(
///     OptionalIdentity(user): OptionalIdentity,
/// ) -> impl IntoResponse {
///     match user {
///         Some(u) => format!("Hello, {}!", u.name),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct OptionalIdentity(pub Option<User>);

impl FromRequestParts<AppState> for OptionalIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Self(None));
        };

        let sessions = SessionManager::new(state.pool(), state.session_keys());
        let user = sessions.validate(token).await?;

        Ok(Self(user))
    }
}

/// Extractor that requires an authenticated identity.
///
/// Rejects with 401 if no valid session token is presented.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub User);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let OptionalIdentity(user) = OptionalIdentity::from_request_parts(parts, state).await?;

        user.map(Self)
            .ok_or_else(|| ApiError::Authentication("unauthorized".to_string()))
    }
}

/// Extractor for the raw bearer token string (used by logout, which revokes
/// the presented token).
pub struct BearerToken(pub String);

impl FromRequestParts<AppState> for BearerToken {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        bearer_token(parts)
            .map(|t| Self(t.to_owned()))
            .ok_or_else(|| ApiError::Authentication("unauthorized".to_string()))
    }
}
