//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use thiserror::Error;

/// Errors shared by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] sliceworks_api::db::RepositoryError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Connect to the database named by `SLICEWORKS_DATABASE_URL`.
pub(crate) async fn connect() -> Result<sqlx::SqlitePool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("SLICEWORKS_DATABASE_URL")
        .map_err(|_| CommandError::MissingEnvVar("SLICEWORKS_DATABASE_URL"))?;

    Ok(sliceworks_api::db::create_pool(&database_url).await?)
}
