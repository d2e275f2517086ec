//! Order repository.
//!
//! Orders are persisted before fulfillment is attempted and are never rolled
//! back: a factory failure leaves the row in place with a terminal failure
//! status (durably recorded intent, best-effort fulfillment).

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use sliceworks_core::{FranchiseId, MenuItemId, OrderId, StoreId, UserId};

use super::RepositoryError;
use crate::models::{FulfillmentStatus, Order, OrderItem};

/// Repository for placed orders.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a new order in the `pending` state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a write fails.
    pub async fn create(
        &self,
        diner_id: UserId,
        franchise_id: FranchiseId,
        store_id: StoreId,
        items: Vec<OrderItem>,
    ) -> Result<Order, RepositoryError> {
        let created_at = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO diner_order (diner_id, franchise_id, store_id, created_at, fulfillment) \
             VALUES (?, ?, ?, ?, 'pending')",
        )
        .bind(diner_id.as_i64())
        .bind(franchise_id.as_i64())
        .bind(store_id.as_i64())
        .bind(created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        let order_id = result.last_insert_rowid();

        for item in &items {
            sqlx::query(
                "INSERT INTO order_item (order_id, menu_id, description, price) VALUES (?, ?, ?, ?)",
            )
            .bind(order_id)
            .bind(item.menu_id.as_i64())
            .bind(&item.description)
            .bind(item.price.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Order {
            id: OrderId::new(order_id),
            franchise_id,
            store_id,
            created_at,
            items,
        })
    }

    /// Record the terminal fulfillment outcome on an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn set_outcome(
        &self,
        order_id: OrderId,
        status: FulfillmentStatus,
        receipt: Option<&str>,
        report_url: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE diner_order SET fulfillment = ?, receipt = ?, report_url = ? WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(receipt)
        .bind(report_url)
        .bind(order_id.as_i64())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Page through a diner's order history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn for_diner(
        &self,
        diner_id: UserId,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Order>, RepositoryError> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);

        let rows = sqlx::query(
            "SELECT id, franchise_id, store_id, created_at FROM diner_order \
             WHERE diner_id = ? ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(diner_id.as_i64())
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let id = OrderId::new(row.try_get("id")?);
            let created_at: String = row.try_get("created_at")?;
            let created_at = parse_timestamp(&created_at)?;

            orders.push(Order {
                id,
                franchise_id: FranchiseId::new(row.try_get("franchise_id")?),
                store_id: StoreId::new(row.try_get("store_id")?),
                created_at,
                items: self.items_for(id).await?,
            });
        }

        Ok(orders)
    }

    /// Fetch the line items for an order.
    async fn items_for(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT menu_id, description, price FROM order_item WHERE order_id = ? ORDER BY id",
        )
        .bind(order_id.as_i64())
        .fetch_all(self.pool)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let price: String = row.try_get("price")?;
            let price = price.parse().map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
            })?;

            items.push(OrderItem {
                menu_id: MenuItemId::new(row.try_get("menu_id")?),
                description: row.try_get("description")?,
                price,
            });
        }

        Ok(items)
    }
}

/// Parse an RFC 3339 timestamp stored as TEXT.
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid timestamp in database: {e}")))
}
