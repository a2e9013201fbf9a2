//! Persistent cart repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

use flagstone_core::{CartItemId, ProductId, UserId};

use super::RepositoryError;
use crate::models::cart::{CartItem, CartItemMetadata, CartLine, CartLineProduct};

#[derive(FromRow)]
struct CartItemRow {
    id: CartItemId,
    user_id: UserId,
    variation_uuid: Uuid,
    product_id: ProductId,
    quantity: i32,
    unit_price: Decimal,
    metadata: Json<CartItemMetadata>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            variation_uuid: row.variation_uuid,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            metadata: row.metadata.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct CartLineRow {
    #[sqlx(flatten)]
    item: CartItemRow,
    product_name: String,
    product_slug: String,
    product_image: Option<String>,
    stock: Option<i32>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        let product = CartLineProduct {
            id: row.item.product_id,
            name: row.product_name,
            slug: row.product_slug,
            image: row.product_image,
        };
        Self {
            item: row.item.into(),
            product,
            stock: row.stock,
        }
    }
}

const ITEM_COLUMNS: &str = "id, user_id, variation_uuid, product_id, quantity, unit_price, \
     metadata, created_at, updated_at";

/// A cart line about to be added.
#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub user_id: UserId,
    pub variation_uuid: Uuid,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub metadata: CartItemMetadata,
}

/// Repository for persistent cart lines.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add a line, or grow the quantity of the user's existing line for the
    /// same variation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    #[instrument(skip(self, item), fields(user_id = %item.user_id, variation = %item.variation_uuid))]
    pub async fn add_or_increment(&self, item: &NewCartItem) -> Result<CartItem, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(&format!(
            r"
            INSERT INTO storefront.cart_item
                (user_id, variation_uuid, product_id, quantity, unit_price, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, variation_uuid) DO UPDATE
            SET quantity = storefront.cart_item.quantity + EXCLUDED.quantity,
                updated_at = NOW()
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(item.user_id)
        .bind(item.variation_uuid)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(Json(&item.metadata))
        .fetch_one(self.pool)
        .await?;
        Ok(row.into())
    }

    /// List a user's lines with product details and current stock, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT c.id, c.user_id, c.variation_uuid, c.product_id, c.quantity, c.unit_price,
                   c.metadata, c.created_at, c.updated_at,
                   p.name AS product_name,
                   p.slug AS product_slug,
                   (SELECT i.url FROM storefront.image i
                    WHERE i.product_id = p.id
                    ORDER BY i.position, i.id
                    LIMIT 1) AS product_image,
                   v.stock
            FROM storefront.cart_item c
            JOIN storefront.product p ON p.id = c.product_id
            LEFT JOIN storefront.variation v ON v.uuid = c.variation_uuid
            WHERE c.user_id = $1
            ORDER BY c.created_at, c.id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a line by ID regardless of owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: CartItemId) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM storefront.cart_item WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Set a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line no longer exists.
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        id: CartItemId,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(&format!(
            r"
            UPDATE storefront.cart_item
            SET quantity = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(id)
        .bind(quantity)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("cart item {id}")))?;
        Ok(row.into())
    }

    /// Delete a line.
    ///
    /// Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: CartItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.cart_item WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
