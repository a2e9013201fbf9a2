//! Cart operations: the persistent cart and the cache-only cart.

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use flagstone_core::{CartItemId, ProductId, UserId, VariationRef};

use crate::cache::{CacheError, CacheStore, cart_key};
use crate::db::carts::{CartRepository, NewCartItem};
use crate::db::catalog::ProductRepository;
use crate::db::RepositoryError;
use crate::models::cart::{
    AddToCart, CachedCartLine, CartItem, CartItemMetadata, CartLine, UpdateQuantity,
    merge_cached_line,
};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("product and variation_id are required")]
    MissingFields,
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error("product {0} does not exist")]
    UnknownProduct(ProductId),
    #[error("variation {0} is not part of product {1}")]
    UnknownVariation(VariationRef, ProductId),
    #[error("cart item {0} not found")]
    NotFound(CartItemId),
    #[error("cart item {0} belongs to another user")]
    NotOwner(CartItemId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// A validated add-to-cart request.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AddRequest {
    product: ProductId,
    variation_id: VariationRef,
    quantity: i32,
}

impl TryFrom<AddToCart> for AddRequest {
    type Error = CartError;

    fn try_from(body: AddToCart) -> Result<Self, Self::Error> {
        let (Some(product), Some(variation_id)) = (body.product, body.variation_id) else {
            return Err(CartError::MissingFields);
        };
        let quantity = body.quantity.unwrap_or(1);
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }
        Ok(Self {
            product,
            variation_id,
            quantity,
        })
    }
}

/// Cart service for one request.
pub struct CartService<'a> {
    pool: &'a PgPool,
    cache: &'a CacheStore,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, cache: &'a CacheStore) -> Self {
        Self { pool, cache }
    }

    /// Add a variation to the user's persistent cart.
    ///
    /// An existing line for the same variation grows by `quantity`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::MissingFields`, `CartError::InvalidQuantity`,
    /// `CartError::UnknownProduct` or `CartError::UnknownVariation` for bad
    /// input.
    #[instrument(skip(self, body), fields(user_id = %user_id))]
    pub async fn add(&self, user_id: UserId, body: AddToCart) -> Result<CartItem, CartError> {
        let request = AddRequest::try_from(body)?;

        let product = ProductRepository::new(self.pool)
            .find(request.product)
            .await?
            .ok_or(CartError::UnknownProduct(request.product))?;

        let variation = product.variation(&request.variation_id).ok_or_else(|| {
            CartError::UnknownVariation(request.variation_id.clone(), product.id)
        })?;
        let variation_uuid = variation.uuid.ok_or_else(|| {
            RepositoryError::DataCorruption(format!("variation of product {} has no uuid", product.id))
        })?;

        let item = NewCartItem {
            user_id,
            variation_uuid,
            product_id: product.id,
            quantity: request.quantity,
            unit_price: variation.pack_price(),
            metadata: CartItemMetadata {
                product_name: product.name.clone(),
                product_image: product.first_image().map(|image| image.url.clone()),
                sku: variation.sku.clone(),
            },
        };

        let line = CartRepository::new(self.pool).add_or_increment(&item).await?;
        tracing::info!(cart_item_id = %line.id, quantity = line.quantity, "Cart line saved");
        Ok(line)
    }

    /// The user's persistent cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<CartLine>, CartError> {
        Ok(CartRepository::new(self.pool).list_for_user(user_id).await?)
    }

    /// Set the quantity of one of the user's lines.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for a missing or non-positive
    /// quantity, `CartError::NotFound` for an unknown line and
    /// `CartError::NotOwner` for another user's line.
    #[instrument(skip(self, body), fields(user_id = %user_id))]
    pub async fn update(
        &self,
        user_id: UserId,
        id: CartItemId,
        body: UpdateQuantity,
    ) -> Result<CartItem, CartError> {
        let quantity = body
            .quantity
            .filter(|q| *q >= 1)
            .ok_or(CartError::InvalidQuantity)?;

        let carts = CartRepository::new(self.pool);
        self.owned_line(&carts, user_id, id).await?;

        carts.set_quantity(id, quantity).await.map_err(|e| match e {
            RepositoryError::NotFound(_) => CartError::NotFound(id),
            other => CartError::Repository(other),
        })
    }

    /// Remove one of the user's lines.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotFound` for an unknown line and
    /// `CartError::NotOwner` for another user's line.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn remove(&self, user_id: UserId, id: CartItemId) -> Result<(), CartError> {
        let carts = CartRepository::new(self.pool);
        self.owned_line(&carts, user_id, id).await?;

        if carts.delete(id).await? {
            Ok(())
        } else {
            Err(CartError::NotFound(id))
        }
    }

    async fn owned_line(
        &self,
        carts: &CartRepository<'_>,
        user_id: UserId,
        id: CartItemId,
    ) -> Result<CartItem, CartError> {
        let line = carts.get(id).await?.ok_or(CartError::NotFound(id))?;
        if line.user_id != user_id {
            tracing::warn!(cart_item_id = %id, "Cart line owned by another user");
            return Err(CartError::NotOwner(id));
        }
        Ok(line)
    }

    // =========================================================================
    // Cache-only cart
    // =========================================================================

    /// The user's cached cart, seeded from the persistent cart on a miss.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Cache` or `CartError::Repository` on backend failure.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn cached(&self, user_id: UserId) -> Result<Vec<CachedCartLine>, CartError> {
        let key = cart_key(user_id);
        if let Some(lines) = self.cache.get_json::<Vec<CachedCartLine>>(&key).await? {
            return Ok(lines);
        }

        let lines: Vec<CachedCartLine> = self
            .list(user_id)
            .await?
            .iter()
            .map(CachedCartLine::from)
            .collect();
        self.cache.set_json(&key, &lines).await?;
        Ok(lines)
    }

    /// Merge a line into the user's cached cart and return the new cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::MissingFields` or `CartError::InvalidQuantity` for
    /// bad input and `CartError::Cache` on backend failure.
    #[instrument(skip(self, body), fields(user_id = %user_id))]
    pub async fn add_cached(
        &self,
        user_id: UserId,
        body: AddToCart,
    ) -> Result<Vec<CachedCartLine>, CartError> {
        let request = AddRequest::try_from(body)?;
        let key = cart_key(user_id);

        let mut lines = self
            .cache
            .get_json::<Vec<CachedCartLine>>(&key)
            .await?
            .unwrap_or_default();
        merge_cached_line(
            &mut lines,
            request.product,
            request.variation_id,
            request.quantity,
        );
        self.cache.set_json(&key, &lines).await?;
        Ok(lines)
    }

    /// Drop the user's cached cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Cache` on backend failure.
    pub async fn clear_cached(&self, user_id: UserId) -> Result<(), CartError> {
        self.cache.delete(&cart_key(user_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sqlx::postgres::PgPoolOptions;

    use super::*;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/flagstone_test")
            .unwrap()
    }

    fn body(product: Option<i32>, variation: Option<VariationRef>, quantity: Option<i32>) -> AddToCart {
        AddToCart {
            product: product.map(ProductId::new),
            variation_id: variation,
            quantity,
        }
    }

    #[test]
    fn test_add_request_defaults_quantity_to_one() {
        let request = AddRequest::try_from(body(Some(1), Some(VariationRef::Id(2)), None)).unwrap();
        assert_eq!(request.quantity, 1);
    }

    #[test]
    fn test_add_request_requires_product_and_variation() {
        assert!(matches!(
            AddRequest::try_from(body(None, Some(VariationRef::Id(2)), Some(1))),
            Err(CartError::MissingFields)
        ));
        assert!(matches!(
            AddRequest::try_from(body(Some(1), None, Some(1))),
            Err(CartError::MissingFields)
        ));
        assert!(matches!(
            AddRequest::try_from(body(Some(1), Some(VariationRef::Id(2)), Some(0))),
            Err(CartError::InvalidQuantity)
        ));
    }

    #[tokio::test]
    async fn test_cached_cart_merges_and_clears() {
        let pool = lazy_pool();
        let cache = CacheStore::in_memory();
        let carts = CartService::new(&pool, &cache);
        let user = UserId::new(5);

        carts
            .add_cached(user, body(Some(1), Some(VariationRef::Id(9)), Some(2)))
            .await
            .unwrap();
        let lines = carts
            .add_cached(user, body(Some(1), Some(VariationRef::Id(9)), None))
            .await
            .unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines.first().unwrap().quantity, 3);

        // Served from the cache without touching the database.
        assert_eq!(carts.cached(user).await.unwrap(), lines);

        carts.clear_cached(user).await.unwrap();
        assert!(cache.get_json::<Vec<CachedCartLine>>(&cart_key(user)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cached_add_rejects_missing_variation() {
        let pool = lazy_pool();
        let cache = CacheStore::in_memory();
        let result = CartService::new(&pool, &cache)
            .add_cached(UserId::new(1), body(Some(1), None, None))
            .await;
        assert!(matches!(result, Err(CartError::MissingFields)));
    }
}
