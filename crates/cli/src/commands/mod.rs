//! CLI command implementations.

pub mod import_postcodes;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Read a database URL, falling back to `DATABASE_URL`.
pub(crate) fn database_url(primary_key: &'static str) -> Result<SecretString, String> {
    dotenvy::dotenv().ok();

    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| format!("{primary_key} not set"))
}
