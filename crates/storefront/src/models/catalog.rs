//! Catalog domain types and the JSON shapes served for them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use flagstone_core::facets::Faceted;
use flagstone_core::{CategoryId, FilterCounts, ImageId, ProductId, Variation};

/// A catalog image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: ImageId,
    pub url: String,
    pub alt: Option<String>,
}

/// SEO metadata attached to a category page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeoMeta {
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub canonical_tag: Option<String>,
    #[serde(default)]
    pub robots: Option<String>,
    #[serde(default)]
    pub og_title: Option<String>,
    #[serde(default)]
    pub og_description: Option<String>,
    #[serde(default)]
    pub og_image: Option<String>,
    #[serde(default)]
    pub twitter_title: Option<String>,
    #[serde(default)]
    pub twitter_description: Option<String>,
    #[serde(default)]
    pub twitter_image: Option<String>,
    /// Structured-data blobs (JSON-LD) rendered verbatim.
    #[serde(default)]
    pub schemas: Option<serde_json::Value>,
}

/// A product with its images and variations.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub slug: String,
    pub product_discount: Decimal,
    pub images: Vec<Image>,
    pub variations: Vec<Variation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Find the variation addressed by a client reference.
    #[must_use]
    pub fn variation(&self, reference: &flagstone_core::VariationRef) -> Option<&Variation> {
        self.variations.iter().find(|v| v.is_referenced_by(reference))
    }

    #[must_use]
    pub fn first_image(&self) -> Option<&Image> {
        self.images.first()
    }
}

impl Faceted for Product {
    fn variations(&self) -> &[Variation] {
        &self.variations
    }

    fn retain_variations<F>(&mut self, keep: F)
    where
        F: FnMut(&Variation) -> bool,
    {
        self.variations.retain(keep);
    }
}

/// A category with every product it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub short_description: Option<String>,
    pub category_discount: Decimal,
    pub images: Vec<Image>,
    pub seo: Option<SeoMeta>,
    pub products: Vec<Product>,
}

/// Entry of `GET /api/categories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub name: String,
    pub slug: String,
    pub category_discount: Decimal,
    pub images: Vec<Image>,
}

/// Product fields shown on a category page card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub product_discount: Decimal,
    pub images: Vec<Image>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            product_discount: product.product_discount,
            images: product.images.clone(),
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// One product on a category page, shown through its first matching variation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductCard {
    pub variation: Option<Variation>,
    pub product: ProductSummary,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            variation: product.variations.first().cloned(),
            product: ProductSummary::from(product),
        }
    }
}

/// Body of `GET /api/category/{slug}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetail {
    pub name: String,
    pub slug: String,
    pub category_discount: Decimal,
    #[serde(rename = "short_description")]
    pub short_description: Option<String>,
    pub images: Vec<Image>,
    /// Number of products left after filtering, across all pages.
    pub total_products: usize,
    pub products: Vec<ProductCard>,
    pub seo: Option<SeoMeta>,
    pub filter_counts: FilterCounts,
}

// =============================================================================
// Seed input
// =============================================================================

/// An image in a catalog seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageSeed {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
}

/// A product in a catalog seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductSeed {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub product_discount: Decimal,
    #[serde(default)]
    pub images: Vec<ImageSeed>,
    #[serde(default)]
    pub variations: Vec<Variation>,
}

/// A category in a catalog seed file, with its products.
#[derive(Debug, Clone, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub category_discount: Decimal,
    #[serde(default)]
    pub images: Vec<ImageSeed>,
    #[serde(default)]
    pub seo: Option<SeoMeta>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}
