//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::ApiConfig;
use crate::factory::{FactoryClient, FactoryError};
use crate::services::session::SessionKeys;
use crate::telemetry::Telemetry;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: SqlitePool,
    factory: FactoryClient,
    session_keys: SessionKeys,
    telemetry: Arc<Telemetry>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the factory client cannot be constructed from the
    /// configuration.
    pub fn new(
        config: ApiConfig,
        pool: SqlitePool,
        telemetry: Arc<Telemetry>,
    ) -> Result<Self, FactoryError> {
        let factory = FactoryClient::new(&config.factory)?;
        let session_keys = SessionKeys::new(&config.jwt_secret);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                factory,
                session_keys,
                telemetry,
            }),
        })
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Get a reference to the factory client.
    #[must_use]
    pub fn factory(&self) -> &FactoryClient {
        &self.inner.factory
    }

    /// Get a reference to the session signing keys.
    #[must_use]
    pub fn session_keys(&self) -> &SessionKeys {
        &self.inner.session_keys
    }

    /// Get a reference to the telemetry component.
    #[must_use]
    pub fn telemetry(&self) -> &Telemetry {
        &self.inner.telemetry
    }
}
