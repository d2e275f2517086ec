//! User repository for database operations.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use sliceworks_core::{Email, Role, RoleSet, UserId};

use super::RepositoryError;
use crate::models::User;

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user with the given roles.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
        roles: RoleSet,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO user (name, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(email.as_str())
        .bind(password_hash)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        let id = result.last_insert_rowid();

        for role in roles.iter() {
            sqlx::query("INSERT INTO user_role (user_id, role) VALUES (?, ?)")
                .bind(id)
                .bind(role.as_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(User {
            id: UserId::new(id),
            name: name.to_owned(),
            email: email.clone(),
            roles,
        })
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, email FROM user WHERE id = ?")
            .bind(id.as_i64())
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(self.hydrate(&r).await?)),
            None => Ok(None),
        }
    }

    /// Get a user and their password hash by email.
    ///
    /// Returns `None` if no user has the given email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_auth_parts(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, email, password_hash FROM user WHERE email = ?")
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        let password_hash: String = r.try_get("password_hash")?;
        let user = self.hydrate(&r).await?;

        Ok(Some((user, password_hash)))
    }

    /// Look up a user's ID by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_id_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserId>, RepositoryError> {
        let row = sqlx::query("SELECT id FROM user WHERE email = ?")
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;

        Ok(match row {
            Some(r) => Some(UserId::new(r.try_get("id")?)),
            None => None,
        })
    }

    /// Update a user's name, email, and/or password hash.
    ///
    /// Absent fields are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new email is taken.
    pub async fn update(
        &self,
        id: UserId,
        name: Option<&str>,
        email: Option<&Email>,
        password_hash: Option<&str>,
    ) -> Result<User, RepositoryError> {
        if self.get_by_id(id).await?.is_none() {
            return Err(RepositoryError::NotFound);
        }

        if let Some(name) = name {
            sqlx::query("UPDATE user SET name = ? WHERE id = ?")
                .bind(name)
                .bind(id.as_i64())
                .execute(self.pool)
                .await?;
        }

        if let Some(email) = email {
            sqlx::query("UPDATE user SET email = ? WHERE id = ?")
                .bind(email.as_str())
                .bind(id.as_i64())
                .execute(self.pool)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        return RepositoryError::Conflict("email already exists".to_owned());
                    }
                    RepositoryError::Database(e)
                })?;
        }

        if let Some(hash) = password_hash {
            sqlx::query("UPDATE user SET password_hash = ? WHERE id = ?")
                .bind(hash)
                .bind(id.as_i64())
                .execute(self.pool)
                .await?;
        }

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Grant a role to a user. Granting an already-held role is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn grant_role(&self, id: UserId, role: Role) -> Result<(), RepositoryError> {
        sqlx::query("INSERT OR IGNORE INTO user_role (user_id, role) VALUES (?, ?)")
            .bind(id.as_i64())
            .bind(role.as_str())
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Build a `User` from a row containing `id`, `name`, and `email`,
    /// fetching the role set.
    async fn hydrate(&self, row: &sqlx::sqlite::SqliteRow) -> Result<User, RepositoryError> {
        let id: i64 = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let email: String = row.try_get("email")?;

        let email = Email::parse(&email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(User {
            id: UserId::new(id),
            name,
            email,
            roles: self.roles_for(UserId::new(id)).await?,
        })
    }

    /// Fetch the role set for a user.
    async fn roles_for(&self, id: UserId) -> Result<RoleSet, RepositoryError> {
        let rows = sqlx::query("SELECT role FROM user_role WHERE user_id = ?")
            .bind(id.as_i64())
            .fetch_all(self.pool)
            .await?;

        let mut roles = RoleSet::empty();
        for row in rows {
            let role: String = row.try_get("role")?;
            let role: Role = role.parse().map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
            })?;
            roles.insert(role);
        }

        Ok(roles)
    }
}

/// Whether a sqlx error is a unique-constraint violation.
fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
