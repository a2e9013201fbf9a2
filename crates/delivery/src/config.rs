//! Delivery service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DELIVERY_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `DELIVERY_HOST` - Bind address (default: 127.0.0.1)
//! - `DELIVERY_PORT` - Listen port (default: 4000)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Delivery service configuration.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    pub sentry_dsn: Option<String>,
}

impl DeliveryConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or a value does
    /// not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // .env is optional
        let _ = dotenvy::dotenv();

        let database_url = std::env::var("DELIVERY_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .map(SecretString::from)
            .map_err(|_| ConfigError::MissingEnvVar("DELIVERY_DATABASE_URL".to_string()))?;

        let host = parse_env_or_default("DELIVERY_HOST", "127.0.0.1")?;
        let port = parse_env_or_default("DELIVERY_PORT", "4000")?;
        let sentry_dsn = std::env::var("SENTRY_DSN")
            .ok()
            .filter(|v| !v.trim().is_empty());

        Ok(Self {
            database_url,
            host,
            port,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_port() {
        let port: u16 = parse_env_or_default("FLAGSTONE_TEST_UNSET_PORT", "4000").unwrap();
        assert_eq!(port, 4000);
    }

    #[test]
    fn test_parse_invalid_default() {
        let result: Result<u16, _> = parse_env_or_default("FLAGSTONE_TEST_UNSET_PORT", "port");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }
}
