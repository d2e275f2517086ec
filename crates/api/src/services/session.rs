//! Session management: issuance, validation, and revocation of bearer
//! tokens.
//!
//! A session token is a signed claims blob that is *also* tracked in the
//! credential store. It is valid iff the signature verifies against the
//! process secret AND the token string is present in the store. Revocation
//! removes the store row, invalidating the token immediately without any
//! expiry machinery. The two failure modes are indistinguishable to callers
//! so a probe can't learn which check failed.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;

use sliceworks_core::{Email, RoleSet, UserId};

use crate::db::RepositoryError;
use crate::db::auth_tokens::AuthTokenRepository;
use crate::models::User;

/// Errors from session operations.
///
/// Only infrastructure failures surface here; an invalid token is not an
/// error, it is "no identity".
#[derive(Debug, Error)]
pub enum SessionError {
    /// Token signing failed.
    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// Credential store unavailable.
    #[error("credential store error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Claims embedded in a session token.
///
/// A plain data record; authorization checks go through
/// [`crate::models::has_role`], not methods on decoded claims.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i64,
    name: String,
    email: Email,
    roles: RoleSet,
    iat: i64,
}

/// Precomputed signing material, built once from the process secret.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl SessionKeys {
    /// Build keys from the configured signing secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();

        // Sessions have no expiry; validity is governed by store presence.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        }
    }
}

/// Session manager over the credential store.
pub struct SessionManager<'a> {
    tokens: AuthTokenRepository<'a>,
    keys: &'a SessionKeys,
}

impl<'a> SessionManager<'a> {
    /// Create a new session manager.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool, keys: &'a SessionKeys) -> Self {
        Self {
            tokens: AuthTokenRepository::new(pool),
            keys,
        }
    }

    /// Issue a session token for a user and record it in the credential
    /// store. Multiple concurrent sessions per user are permitted.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if signing fails or the store write fails
    /// (fatal, surfaced as 5xx upstream).
    pub async fn issue(&self, user: &User) -> Result<String, SessionError> {
        let issued_at = Utc::now();
        let claims = Claims {
            sub: user.id.as_i64(),
            name: user.name.clone(),
            email: user.email.clone(),
            roles: user.roles,
            iat: issued_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.keys.encoding)?;
        self.tokens.insert(&token, user.id, issued_at).await?;

        Ok(token)
    }

    /// Resolve a token to its identity.
    ///
    /// Fails closed: a bad signature and an absent store row both yield
    /// `None`, indistinguishably. Only a store failure is an error.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Repository` if the store lookup fails.
    pub async fn validate(&self, token: &str) -> Result<Option<User>, SessionError> {
        let Ok(data) = decode::<Claims>(token, &self.keys.decoding, &self.keys.validation) else {
            return Ok(None);
        };

        if !self.tokens.contains(token).await? {
            return Ok(None);
        }

        let claims = data.claims;
        Ok(Some(User {
            id: UserId::new(claims.sub),
            name: claims.name,
            email: claims.email,
            roles: claims.roles,
        }))
    }

    /// Revoke a token. Revoking an already-invalid token is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Repository` if the store delete fails.
    pub async fn revoke(&self, token: &str) -> Result<(), SessionError> {
        self.tokens.revoke(token).await?;
        Ok(())
    }
}
