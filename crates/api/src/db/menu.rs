//! Menu repository.

use sqlx::{Row, SqlitePool};

use sliceworks_core::MenuItemId;

use super::RepositoryError;
use crate::models::{MenuItem, NewMenuItem};

/// Repository for the menu.
pub struct MenuRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MenuRepository<'a> {
    /// Create a new menu repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List the full menu.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn list(&self) -> Result<Vec<MenuItem>, RepositoryError> {
        let rows = sqlx::query("SELECT id, title, description, image, price FROM menu ORDER BY id")
            .fetch_all(self.pool)
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let price: String = row.try_get("price")?;
            let price = price.parse().map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
            })?;

            items.push(MenuItem {
                id: MenuItemId::new(row.try_get("id")?),
                title: row.try_get("title")?,
                description: row.try_get("description")?,
                image: row.try_get("image")?,
                price,
            });
        }

        Ok(items)
    }

    /// Add an item to the menu.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn add(&self, item: &NewMenuItem) -> Result<MenuItemId, RepositoryError> {
        let result =
            sqlx::query("INSERT INTO menu (title, description, image, price) VALUES (?, ?, ?, ?)")
                .bind(&item.title)
                .bind(&item.description)
                .bind(&item.image)
                .bind(item.price.to_string())
                .execute(self.pool)
                .await?;

        Ok(MenuItemId::new(result.last_insert_rowid()))
    }
}
