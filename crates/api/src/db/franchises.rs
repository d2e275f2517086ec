//! Franchise and store repository.

use sqlx::{Row, SqlitePool};

use sliceworks_core::{Email, FranchiseId, Role, StoreId, UserId};

use super::RepositoryError;
use super::users::UserRepository;
use crate::models::{Franchise, Store, UserSummary};

/// Repository for franchises and their stores.
pub struct FranchiseRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FranchiseRepository<'a> {
    /// Create a new franchise repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List all franchises with their stores and admins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self) -> Result<Vec<Franchise>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name FROM franchise ORDER BY id")
            .fetch_all(self.pool)
            .await?;

        let mut franchises = Vec::with_capacity(rows.len());
        for row in rows {
            franchises.push(self.hydrate(&row).await?);
        }

        Ok(franchises)
    }

    /// List the franchises a user administers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn for_user(&self, user_id: UserId) -> Result<Vec<Franchise>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT f.id, f.name FROM franchise f \
             JOIN franchise_admin fa ON fa.franchise_id = f.id \
             WHERE fa.user_id = ? ORDER BY f.id",
        )
        .bind(user_id.as_i64())
        .fetch_all(self.pool)
        .await?;

        let mut franchises = Vec::with_capacity(rows.len());
        for row in rows {
            franchises.push(self.hydrate(&row).await?);
        }

        Ok(franchises)
    }

    /// Create a franchise and install its admins.
    ///
    /// Each admin email must reference an existing user; the Franchisee role
    /// is granted to each admin as a side effect.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if an admin email is unknown.
    /// Returns `RepositoryError::Conflict` if the franchise name is taken.
    pub async fn create(
        &self,
        name: &str,
        admin_emails: &[Email],
    ) -> Result<Franchise, RepositoryError> {
        let users = UserRepository::new(self.pool);

        // Resolve admins up front so an unknown email creates nothing.
        let mut admin_ids = Vec::with_capacity(admin_emails.len());
        for email in admin_emails {
            let id = users
                .find_id_by_email(email)
                .await?
                .ok_or(RepositoryError::NotFound)?;
            admin_ids.push(id);
        }

        let result = sqlx::query("INSERT INTO franchise (name) VALUES (?)")
            .bind(name)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if matches!(&e, sqlx::Error::Database(db_err) if db_err.is_unique_violation()) {
                    return RepositoryError::Conflict("franchise name already exists".to_owned());
                }
                RepositoryError::Database(e)
            })?;

        let franchise_id = FranchiseId::new(result.last_insert_rowid());

        for id in &admin_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO franchise_admin (franchise_id, user_id) VALUES (?, ?)",
            )
            .bind(franchise_id.as_i64())
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;
            users.grant_role(*id, Role::Franchisee).await?;
        }

        self.get(franchise_id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Get a franchise by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: FranchiseId) -> Result<Option<Franchise>, RepositoryError> {
        let row = sqlx::query("SELECT id, name FROM franchise WHERE id = ?")
            .bind(id.as_i64())
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(self.hydrate(&r).await?)),
            None => Ok(None),
        }
    }

    /// Delete a franchise and everything it owns (stores, admin links).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the franchise doesn't exist —
    /// deleting an already-deleted franchise is a not-found outcome, not a
    /// silent success.
    pub async fn delete(&self, id: FranchiseId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM store WHERE franchise_id = ?")
            .bind(id.as_i64())
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM franchise_admin WHERE franchise_id = ?")
            .bind(id.as_i64())
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM franchise WHERE id = ?")
            .bind(id.as_i64())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    /// Create a store within a franchise.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the franchise doesn't exist.
    pub async fn create_store(
        &self,
        franchise_id: FranchiseId,
        name: &str,
    ) -> Result<Store, RepositoryError> {
        if self.get(franchise_id).await?.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let result = sqlx::query("INSERT INTO store (franchise_id, name) VALUES (?, ?)")
            .bind(franchise_id.as_i64())
            .bind(name)
            .execute(self.pool)
            .await?;

        Ok(Store {
            id: StoreId::new(result.last_insert_rowid()),
            franchise_id,
            name: name.to_owned(),
        })
    }

    /// Delete a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such store exists in the
    /// franchise.
    pub async fn delete_store(
        &self,
        franchise_id: FranchiseId,
        store_id: StoreId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store WHERE id = ? AND franchise_id = ?")
            .bind(store_id.as_i64())
            .bind(franchise_id.as_i64())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Whether a user administers a franchise.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_admin(
        &self,
        franchise_id: FranchiseId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM franchise_admin WHERE franchise_id = ? AND user_id = ?",
        )
        .bind(franchise_id.as_i64())
        .bind(user_id.as_i64())
        .fetch_one(self.pool)
        .await?;

        let count: i64 = row.try_get("n")?;
        Ok(count > 0)
    }

    /// Build a `Franchise` from a row containing `id` and `name`.
    async fn hydrate(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Franchise, RepositoryError> {
        let id = FranchiseId::new(row.try_get("id")?);
        let name: String = row.try_get("name")?;

        let store_rows =
            sqlx::query("SELECT id, franchise_id, name FROM store WHERE franchise_id = ? ORDER BY id")
                .bind(id.as_i64())
                .fetch_all(self.pool)
                .await?;

        let mut stores = Vec::with_capacity(store_rows.len());
        for s in store_rows {
            stores.push(Store {
                id: StoreId::new(s.try_get("id")?),
                franchise_id: FranchiseId::new(s.try_get("franchise_id")?),
                name: s.try_get("name")?,
            });
        }

        let admin_rows = sqlx::query(
            "SELECT u.id, u.name, u.email FROM user u \
             JOIN franchise_admin fa ON fa.user_id = u.id \
             WHERE fa.franchise_id = ? ORDER BY u.id",
        )
        .bind(id.as_i64())
        .fetch_all(self.pool)
        .await?;

        let mut admins = Vec::with_capacity(admin_rows.len());
        for a in admin_rows {
            let email: String = a.try_get("email")?;
            let email = Email::parse(&email).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;
            admins.push(UserSummary {
                id: UserId::new(a.try_get("id")?),
                name: a.try_get("name")?,
                email,
            });
        }

        Ok(Franchise {
            id,
            name,
            admins,
            stores,
        })
    }
}
