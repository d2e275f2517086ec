//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SLICEWORKS_DATABASE_URL` - `SQLite` connection string (e.g., `sqlite://sliceworks.db`)
//! - `SLICEWORKS_JWT_SECRET` - Session token signing secret (min 32 chars)
//! - `FACTORY_URL` - Base URL of the external fulfillment factory
//! - `FACTORY_API_KEY` - Shared secret sent as a bearer credential to the factory
//!
//! ## Optional
//! - `SLICEWORKS_HOST` - Bind address (default: 127.0.0.1)
//! - `SLICEWORKS_PORT` - Listen port (default: 3000)
//! - `FACTORY_TIMEOUT_SECS` - Factory request timeout (default: 10)
//! - `TELEMETRY_URL` - Metrics collector push endpoint (unset: metrics are dropped)
//! - `TELEMETRY_API_KEY` - Collector bearer credential
//! - `TELEMETRY_SOURCE` - Source label attached to every metric line (default: sliceworks)
//! - `TELEMETRY_FLUSH_SECS` - Flush-and-reset interval (default: 10)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `SQLite` database connection URL
    pub database_url: String,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Session token signing secret
    pub jwt_secret: SecretString,
    /// Fulfillment factory configuration
    pub factory: FactoryConfig,
    /// Telemetry collector configuration
    pub telemetry: TelemetryConfig,
}

/// Fulfillment factory configuration.
///
/// Implements `Debug` manually to redact the shared API key.
#[derive(Clone)]
pub struct FactoryConfig {
    /// Base URL of the factory service
    pub url: String,
    /// Shared secret sent as a bearer credential
    pub api_key: SecretString,
    /// Bounded wait for a factory response
    pub timeout: Duration,
}

impl std::fmt::Debug for FactoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Telemetry collector configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Collector push endpoint; metrics are dropped when unset
    pub url: Option<String>,
    /// Collector bearer credential
    pub api_key: Option<SecretString>,
    /// Source label attached to every metric line
    pub source: String,
    /// Flush-and-reset interval
    pub flush_interval: Duration,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the signing secret fails the minimum-length check.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_required_env("SLICEWORKS_DATABASE_URL")?;
        let host = get_env_or_default("SLICEWORKS_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SLICEWORKS_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("SLICEWORKS_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SLICEWORKS_PORT".to_string(), e.to_string())
            })?;
        let jwt_secret = get_required_secret("SLICEWORKS_JWT_SECRET")?;
        validate_jwt_secret(&jwt_secret, "SLICEWORKS_JWT_SECRET")?;

        let factory = FactoryConfig::from_env()?;
        let telemetry = TelemetryConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            factory,
            telemetry,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl FactoryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs = get_env_or_default("FACTORY_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("FACTORY_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            url: get_required_env("FACTORY_URL")?,
            api_key: get_required_secret("FACTORY_API_KEY")?,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl TelemetryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let flush_secs = get_env_or_default("TELEMETRY_FLUSH_SECS", "10")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("TELEMETRY_FLUSH_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            url: get_optional_env("TELEMETRY_URL"),
            api_key: get_optional_env("TELEMETRY_API_KEY").map(SecretString::from),
            source: get_env_or_default("TELEMETRY_SOURCE", "sliceworks"),
            flush_interval: Duration::from_secs(flush_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that the signing secret meets minimum length requirements.
fn validate_jwt_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}
