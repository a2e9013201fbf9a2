//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! flagstone-cli migrate storefront
//! flagstone-cli migrate delivery
//! flagstone-cli migrate all
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string for storefront
//! - `DELIVERY_DATABASE_URL` - `PostgreSQL` connection string for delivery
//!
//! Both fall back to `DATABASE_URL`, so a single database can host the
//! `storefront` and `delivery` schemas.
//!
//! # Migration Files
//!
//! Storefront migrations: `crates/storefront/migrations/`
//! Delivery migrations: `crates/delivery/migrations/`

use secrecy::ExposeSecret;
use sqlx::PgPool;
use thiserror::Error;

use super::database_url;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("{0}")]
    MissingEnvVar(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the URL is missing, the database is
/// unreachable or a migration fails.
pub async fn storefront() -> Result<(), MigrationError> {
    let pool = connect("STOREFRONT_DATABASE_URL", "storefront").await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Storefront migrations complete");
    Ok(())
}

/// Run delivery database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the URL is missing, the database is
/// unreachable or a migration fails.
pub async fn delivery() -> Result<(), MigrationError> {
    let pool = connect("DELIVERY_DATABASE_URL", "delivery").await?;

    tracing::info!("Running delivery migrations...");
    sqlx::migrate!("../delivery/migrations").run(&pool).await?;

    tracing::info!("Delivery migrations complete");
    Ok(())
}

async fn connect(key: &'static str, name: &str) -> Result<PgPool, MigrationError> {
    let url = database_url(key).map_err(MigrationError::MissingEnvVar)?;
    tracing::info!("Connecting to {name} database...");
    Ok(PgPool::connect(url.expose_secret()).await?)
}
