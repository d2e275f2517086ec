//! Credential store: the active-session token table.
//!
//! A signed session token is only valid while its row exists here. Deleting
//! the row revokes the session immediately; there is no expiry. Validity is
//! monotonic-decreasing: once revoked, a token value can never become valid
//! again (a fresh login issues a new token string).

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use sliceworks_core::UserId;

use super::RepositoryError;

/// Repository for active session tokens.
pub struct AuthTokenRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AuthTokenRepository<'a> {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a freshly issued token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn insert(
        &self,
        token: &str,
        user_id: UserId,
        issued_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT OR REPLACE INTO auth_token (token, user_id, issued_at) VALUES (?, ?, ?)")
            .bind(token)
            .bind(user_id.as_i64())
            .bind(issued_at.to_rfc3339())
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Whether a token is currently active.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn contains(&self, token: &str) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM auth_token WHERE token = ?")
            .bind(token)
            .fetch_one(self.pool)
            .await?;

        let count: i64 = row.try_get("n")?;
        Ok(count > 0)
    }

    /// Remove a token. Removing an absent token is a no-op, not an error,
    /// so concurrent revocations of the same token both succeed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn revoke(&self, token: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM auth_token WHERE token = ?")
            .bind(token)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
