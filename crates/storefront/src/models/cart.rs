//! Cart types: persistent cart lines and the cache-only cart.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use flagstone_core::{CartItemId, ProductId, UserId, VariationRef};

/// Denormalized product data captured when a line is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemMetadata {
    pub product_name: String,
    pub product_image: Option<String>,
    pub sku: Option<String>,
}

/// A persistent cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    /// UUID of the variation this line is for.
    pub variation_uuid: Uuid,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub metadata: CartItemMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Product fields joined onto a cart line for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLineProduct {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
}

/// A cart line with its product and current stock, as listed by `GET /api/cart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItem,
    pub product: CartLineProduct,
    pub stock: Option<i32>,
}

/// Sum of all line totals.
#[must_use]
pub fn subtotal(lines: &[CartLine]) -> Decimal {
    lines.iter().map(|line| line.item.line_total()).sum()
}

/// Body of `POST /api/cart/add` and `POST /api/cart/redis/add`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddToCart {
    #[serde(default)]
    pub product: Option<ProductId>,
    #[serde(default)]
    pub variation_id: Option<VariationRef>,
    #[serde(default)]
    pub quantity: Option<i32>,
}

/// Body of `PUT /api/cart/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateQuantity {
    #[serde(default)]
    pub quantity: Option<i32>,
}

/// A line of the cache-only cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedCartLine {
    pub product: ProductId,
    pub variation_id: VariationRef,
    pub quantity: i32,
}

impl From<&CartLine> for CachedCartLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product: line.item.product_id,
            variation_id: VariationRef::Uuid(line.item.variation_uuid),
            quantity: line.item.quantity,
        }
    }
}

/// Merge `quantity` of a variation into a cached cart.
///
/// Lines are matched by `variation_id`; a matching line's quantity grows,
/// otherwise a new line is appended.
pub fn merge_cached_line(
    cart: &mut Vec<CachedCartLine>,
    product: ProductId,
    variation_id: VariationRef,
    quantity: i32,
) {
    if let Some(line) = cart.iter_mut().find(|l| l.variation_id == variation_id) {
        line.quantity = line.quantity.saturating_add(quantity);
    } else {
        cart.push(CachedCartLine {
            product,
            variation_id,
            quantity,
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_increments_matching_variation() {
        let mut cart = Vec::new();
        merge_cached_line(&mut cart, ProductId::new(1), VariationRef::Id(7), 1);
        merge_cached_line(&mut cart, ProductId::new(1), VariationRef::Id(7), 3);
        merge_cached_line(&mut cart, ProductId::new(2), VariationRef::Id(8), 2);

        assert_eq!(cart.len(), 2);
        assert_eq!(cart[0].quantity, 4);
        assert_eq!(cart[1].variation_id, VariationRef::Id(8));
    }

    #[test]
    fn test_add_to_cart_accepts_string_or_number_variation() {
        let body: AddToCart =
            serde_json::from_str(r#"{"product": 3, "variation_id": "12"}"#).unwrap();
        assert_eq!(body.product, Some(ProductId::new(3)));
        assert_eq!(body.variation_id, Some(VariationRef::Id(12)));
        assert_eq!(body.quantity, None);

        let body: AddToCart = serde_json::from_str(r#"{"variation_id": 12}"#).unwrap();
        assert!(body.product.is_none());
    }

    #[test]
    fn test_line_total() {
        let now = Utc::now();
        let item = CartItem {
            id: CartItemId::new(1),
            user_id: UserId::new(1),
            variation_uuid: Uuid::new_v4(),
            product_id: ProductId::new(1),
            quantity: 3,
            unit_price: "50.39".parse().unwrap(),
            metadata: CartItemMetadata::default(),
            created_at: now,
            updated_at: now,
        };
        assert_eq!(item.line_total(), "151.17".parse::<Decimal>().unwrap());
    }
}
