//! Database operations for delivery `PostgreSQL`.
//!
//! # Schema: `delivery`
//!
//! - `postcode_price` - Economy and premium prices, unique per postcode
//!
//! Migrations live in `crates/delivery/migrations/` and run via:
//! ```bash
//! cargo run -p flagstone-cli -- migrate delivery
//! ```

use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use flagstone_core::Postcode;

/// Delivery prices for one postcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct PostcodePrice {
    pub postcode: String,
    pub economy_price: Decimal,
    pub premium_price: Decimal,
}

/// Whether an upsert created or replaced a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Inserted,
    Updated,
}

/// Repository for postcode prices.
pub struct PostcodeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PostcodeRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Prices for an exact postcode.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the query fails.
    #[instrument(skip(self), fields(postcode = %postcode))]
    pub async fn find(&self, postcode: &Postcode) -> Result<Option<PostcodePrice>, sqlx::Error> {
        sqlx::query_as::<_, PostcodePrice>(
            r"
            SELECT postcode, economy_price, premium_price
            FROM delivery.postcode_price
            WHERE postcode = $1
            ",
        )
        .bind(postcode.as_str())
        .fetch_optional(self.pool)
        .await
    }

    /// Insert prices for a postcode, or replace the existing ones.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the query fails.
    #[instrument(skip(self), fields(postcode = %postcode))]
    pub async fn upsert(
        &self,
        postcode: &Postcode,
        economy: Decimal,
        premium: Decimal,
    ) -> Result<Upserted, sqlx::Error> {
        // xmax is zero only for a freshly inserted tuple
        let inserted: bool = sqlx::query_scalar(
            r"
            INSERT INTO delivery.postcode_price (postcode, economy_price, premium_price)
            VALUES ($1, $2, $3)
            ON CONFLICT (postcode) DO UPDATE
            SET economy_price = EXCLUDED.economy_price,
                premium_price = EXCLUDED.premium_price,
                updated_at = NOW()
            RETURNING (xmax = 0)
            ",
        )
        .bind(postcode.as_str())
        .bind(economy)
        .bind(premium)
        .fetch_one(self.pool)
        .await?;

        Ok(if inserted {
            Upserted::Inserted
        } else {
            Upserted::Updated
        })
    }

    /// Replace the prices of an existing postcode.
    ///
    /// Returns `false` when the postcode is unknown.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the query fails.
    #[instrument(skip(self), fields(postcode = %postcode))]
    pub async fn update(
        &self,
        postcode: &Postcode,
        economy: Decimal,
        premium: Decimal,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r"
            UPDATE delivery.postcode_price
            SET economy_price = $2, premium_price = $3, updated_at = NOW()
            WHERE postcode = $1
            ",
        )
        .bind(postcode.as_str())
        .bind(economy)
        .bind(premium)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Postcodes starting with `prefix`, in ascending order.
    ///
    /// `prefix` must already be normalised.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the query fails.
    #[instrument(skip(self))]
    pub async fn search_prefix(&self, prefix: &str) -> Result<Vec<PostcodePrice>, sqlx::Error> {
        sqlx::query_as::<_, PostcodePrice>(
            r"
            SELECT postcode, economy_price, premium_price
            FROM delivery.postcode_price
            WHERE postcode LIKE $1 || '%'
            ORDER BY postcode ASC
            ",
        )
        .bind(escape_like(prefix))
        .fetch_all(self.pool)
        .await
    }

    /// Upsert many rows in one transaction.
    ///
    /// Either every row is written or none is.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if any statement fails.
    #[instrument(skip(self, rows), fields(count = rows.len()))]
    pub async fn upsert_many(&self, rows: &[PostcodePrice]) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for row in rows {
            let result = sqlx::query(
                r"
                INSERT INTO delivery.postcode_price (postcode, economy_price, premium_price)
                VALUES ($1, $2, $3)
                ON CONFLICT (postcode) DO UPDATE
                SET economy_price = EXCLUDED.economy_price,
                    premium_price = EXCLUDED.premium_price,
                    updated_at = NOW()
                ",
            )
            .bind(&row.postcode)
            .bind(row.economy_price)
            .bind(row.premium_price)
            .execute(&mut *tx)
            .await?;
            written += result.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }
}

/// Escape `LIKE` wildcards so a prefix matches literally.
fn escape_like(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("SW1"), "SW1");
        assert_eq!(escape_like("A_%"), "A\\_\\%");
        assert_eq!(escape_like("\\"), "\\\\");
    }
}
