//! Database operations for storefront `PostgreSQL`.
//!
//! # Schema: `storefront`
//!
//! ## Tables
//!
//! - `category`, `product`, `variation`, `image` - The catalog
//! - `app_user` - Site accounts (argon2 password hashes)
//! - `user_details` - Profile details, one row per user
//! - `upload_file` - Files stored under the uploads directory
//! - `cart_item` - Persistent cart lines, unique per (user, variation)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p flagstone-cli -- migrate storefront
//! ```

pub mod carts;
pub mod catalog;
pub mod uploads;
pub mod user_details;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::CartRepository;
pub use catalog::{CategoryRepository, ProductRepository};
pub use uploads::UploadRepository;
pub use user_details::UserDetailsRepository;
pub use users::UserRepository;

/// Errors returned by the repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The underlying query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A row the operation depends on does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Stored data failed validation when read back.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Map a unique violation to `RepositoryError::Conflict`.
pub(crate) fn conflict_on_unique(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(err)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
