//! Database migration command.
//!
//! # Environment Variables
//!
//! - `SLICEWORKS_DATABASE_URL` - `SQLite` connection string

use super::{CommandError, connect};

/// Run all pending migrations.
pub async fn run() -> Result<(), CommandError> {
    tracing::info!("Connecting to database...");
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sliceworks_api::db::MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
