//! Database operations for the Sliceworks `SQLite` database.
//!
//! # Tables
//!
//! - `user` / `user_role` - Registered identities and their role sets
//! - `auth_token` - Active session tokens (presence == validity)
//! - `menu` - The menu
//! - `franchise` / `franchise_admin` / `store` - Franchise structure
//! - `diner_order` / `order_item` - Placed orders and their items
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p sliceworks-cli -- migrate
//! ```
//!
//! Queries use the sqlx runtime API (not the compile-time macros, which
//! require a live database at build time).

pub mod auth_tokens;
pub mod franchises;
pub mod menu;
pub mod orders;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

/// Embedded migrations for the service schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors returned by the repository layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unique constraint violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Referenced row does not exist.
    #[error("not found")]
    NotFound,

    /// Stored data failed to parse.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `SQLite` connection pool with sensible defaults.
///
/// In-memory databases get a single pooled connection that is never
/// recycled (every connection to `:memory:` is a distinct database).
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
    } else {
        SqlitePoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options.journal_mode(SqliteJournalMode::Wal))
            .await
    }
}
