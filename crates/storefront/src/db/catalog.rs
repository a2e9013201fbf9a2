//! Category and product repositories.
//!
//! A category page needs every product of the category with all of its
//! variations and images, so loading happens in four flat queries that are
//! stitched together in memory rather than one wide join.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::instrument;
use uuid::Uuid;

use flagstone_core::{CategoryId, ImageId, ProductId, Variation, VariationId};

use super::RepositoryError;
use crate::models::catalog::{
    Category, CategorySeed, CategorySummary, Image, ImageSeed, Product, ProductSeed, SeoMeta,
};

// =============================================================================
// Row types
// =============================================================================

#[derive(FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    slug: String,
    short_description: Option<String>,
    category_discount: Decimal,
    seo: Option<Json<SeoMeta>>,
}

#[derive(FromRow)]
struct ProductRow {
    id: ProductId,
    category_id: CategoryId,
    name: String,
    slug: String,
    product_discount: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct VariationRow {
    id: VariationId,
    product_id: ProductId,
    uuid: Uuid,
    sku: Option<String>,
    thickness: Option<String>,
    size: Option<String>,
    finish: Option<String>,
    color_tone: Option<String>,
    pack_size: Option<Decimal>,
    pcs: Option<i32>,
    stock: Option<i32>,
    price: Option<Decimal>,
    per_m2: Option<Decimal>,
}

impl From<VariationRow> for Variation {
    fn from(row: VariationRow) -> Self {
        Self {
            id: Some(row.id),
            uuid: Some(row.uuid),
            sku: row.sku,
            thickness: row.thickness,
            size: row.size,
            finish: row.finish,
            pack_size: row.pack_size,
            pcs: row.pcs,
            stock: row.stock,
            color_tone: row.color_tone,
            price: row.price,
            per_m2: row.per_m2,
        }
    }
}

#[derive(FromRow)]
struct ImageRow {
    id: ImageId,
    category_id: Option<CategoryId>,
    product_id: Option<ProductId>,
    url: String,
    alt: Option<String>,
}

impl ImageRow {
    fn into_image(self) -> Image {
        Image {
            id: self.id,
            url: self.url,
            alt: self.alt,
        }
    }
}

const VARIATION_COLUMNS: &str = "v.id, v.product_id, v.uuid, v.sku, v.thickness, v.size, \
     v.finish, v.color_tone, v.pack_size, v.pcs, v.stock, v.price, v.per_m2";

/// Attach variations and images to product rows, keeping row order.
fn assemble_products(
    rows: Vec<ProductRow>,
    variations: Vec<VariationRow>,
    images: Vec<ImageRow>,
) -> Vec<Product> {
    let mut variations_by_product: HashMap<ProductId, Vec<Variation>> = HashMap::new();
    for row in variations {
        variations_by_product
            .entry(row.product_id)
            .or_default()
            .push(row.into());
    }

    let mut images_by_product: HashMap<ProductId, Vec<Image>> = HashMap::new();
    for row in images {
        if let Some(product_id) = row.product_id {
            images_by_product
                .entry(product_id)
                .or_default()
                .push(row.into_image());
        }
    }

    rows.into_iter()
        .map(|row| Product {
            variations: variations_by_product.remove(&row.id).unwrap_or_default(),
            images: images_by_product.remove(&row.id).unwrap_or_default(),
            id: row.id,
            category_id: row.category_id,
            name: row.name,
            slug: row.slug,
            product_discount: row.product_discount,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect()
}

// =============================================================================
// CategoryRepository
// =============================================================================

/// Repository for categories.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List categories, one per slug, with their images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<CategorySummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT DISTINCT ON (slug)
                   id, name, slug, short_description, category_discount, seo
            FROM storefront.category
            ORDER BY slug, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id.as_i32()).collect();
        let images = sqlx::query_as::<_, ImageRow>(
            r"
            SELECT id, category_id, product_id, url, alt
            FROM storefront.image
            WHERE category_id = ANY($1)
            ORDER BY position, id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut images_by_category: HashMap<CategoryId, Vec<Image>> = HashMap::new();
        for row in images {
            if let Some(category_id) = row.category_id {
                images_by_category
                    .entry(category_id)
                    .or_default()
                    .push(row.into_image());
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| CategorySummary {
                images: images_by_category.remove(&row.id).unwrap_or_default(),
                name: row.name,
                slug: row.slug,
                category_discount: row.category_discount,
            })
            .collect())
    }

    /// Load a category with all of its products, variations and images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let Some(category) = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, slug, short_description, category_discount, seo
            FROM storefront.category
            WHERE slug = $1
            ",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let products = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, category_id, name, slug, product_discount, created_at, updated_at
            FROM storefront.product
            WHERE category_id = $1
            ORDER BY id
            ",
        )
        .bind(category.id)
        .fetch_all(self.pool)
        .await?;

        let variations = sqlx::query_as::<_, VariationRow>(&format!(
            r"
            SELECT {VARIATION_COLUMNS}
            FROM storefront.variation v
            JOIN storefront.product p ON p.id = v.product_id
            WHERE p.category_id = $1
            ORDER BY v.product_id, v.position, v.id
            "
        ))
        .bind(category.id)
        .fetch_all(self.pool)
        .await?;

        let images = sqlx::query_as::<_, ImageRow>(
            r"
            SELECT i.id, i.category_id, i.product_id, i.url, i.alt
            FROM storefront.image i
            LEFT JOIN storefront.product p ON p.id = i.product_id
            WHERE i.category_id = $1 OR p.category_id = $1
            ORDER BY i.position, i.id
            ",
        )
        .bind(category.id)
        .fetch_all(self.pool)
        .await?;

        let (category_images, product_images): (Vec<_>, Vec<_>) =
            images.into_iter().partition(|row| row.category_id.is_some());

        Ok(Some(Category {
            id: category.id,
            name: category.name,
            slug: category.slug,
            short_description: category.short_description,
            category_discount: category.category_discount,
            images: category_images.into_iter().map(ImageRow::into_image).collect(),
            seo: category.seo.map(|Json(seo)| seo),
            products: assemble_products(products, variations, product_images),
        }))
    }

    /// Insert or update a category and its images from a seed entry.
    ///
    /// Products are saved separately through [`ProductRepository::save`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self, seed), fields(slug = %seed.slug))]
    pub async fn upsert(&self, seed: &CategorySeed) -> Result<CategoryId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: CategoryId = sqlx::query_scalar(
            r"
            INSERT INTO storefront.category (name, slug, short_description, category_discount, seo)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (slug) DO UPDATE
            SET name = EXCLUDED.name,
                short_description = EXCLUDED.short_description,
                category_discount = EXCLUDED.category_discount,
                seo = EXCLUDED.seo,
                updated_at = NOW()
            RETURNING id
            ",
        )
        .bind(&seed.name)
        .bind(&seed.slug)
        .bind(&seed.short_description)
        .bind(seed.category_discount)
        .bind(seed.seo.as_ref().map(Json))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM storefront.image WHERE category_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_images(&mut tx, ImageOwner::Category(id), &seed.images).await?;

        tx.commit().await?;
        Ok(id)
    }
}

// =============================================================================
// ProductRepository
// =============================================================================

/// Repository for products and their variations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load a single product with its variations and images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn find(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, category_id, name, slug, product_discount, created_at, updated_at
            FROM storefront.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let variations = sqlx::query_as::<_, VariationRow>(&format!(
            r"
            SELECT {VARIATION_COLUMNS}
            FROM storefront.variation v
            WHERE v.product_id = $1
            ORDER BY v.position, v.id
            "
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let images = sqlx::query_as::<_, ImageRow>(
            r"
            SELECT id, category_id, product_id, url, alt
            FROM storefront.image
            WHERE product_id = $1
            ORDER BY position, id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(assemble_products(vec![row], variations, images).pop())
    }

    /// Insert or update a product with its variations and images.
    ///
    /// Variations without a uuid get a fresh v4 uuid; existing uuids are kept
    /// so cart lines keep pointing at the same variation. Variations missing
    /// from `seed` are removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self, seed), fields(slug = %seed.slug))]
    pub async fn save(
        &self,
        category_id: CategoryId,
        seed: &ProductSeed,
    ) -> Result<ProductId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: ProductId = sqlx::query_scalar(
            r"
            INSERT INTO storefront.product (category_id, name, slug, product_discount)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (slug) DO UPDATE
            SET category_id = EXCLUDED.category_id,
                name = EXCLUDED.name,
                product_discount = EXCLUDED.product_discount,
                updated_at = NOW()
            RETURNING id
            ",
        )
        .bind(category_id)
        .bind(&seed.name)
        .bind(&seed.slug)
        .bind(seed.product_discount)
        .fetch_one(&mut *tx)
        .await?;

        let variations = with_assigned_uuids(&seed.variations);
        let mut kept: Vec<Uuid> = Vec::with_capacity(variations.len());

        for (position, variation) in (0_i32..).zip(&variations) {
            let uuid = variation.uuid.unwrap_or_else(Uuid::new_v4);
            kept.push(uuid);
            sqlx::query(
                r"
                INSERT INTO storefront.variation
                    (product_id, uuid, position, sku, thickness, size, finish, color_tone,
                     pack_size, pcs, stock, price, per_m2)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                ON CONFLICT (uuid) DO UPDATE
                SET product_id = EXCLUDED.product_id,
                    position = EXCLUDED.position,
                    sku = EXCLUDED.sku,
                    thickness = EXCLUDED.thickness,
                    size = EXCLUDED.size,
                    finish = EXCLUDED.finish,
                    color_tone = EXCLUDED.color_tone,
                    pack_size = EXCLUDED.pack_size,
                    pcs = EXCLUDED.pcs,
                    stock = EXCLUDED.stock,
                    price = EXCLUDED.price,
                    per_m2 = EXCLUDED.per_m2
                ",
            )
            .bind(id)
            .bind(uuid)
            .bind(position)
            .bind(&variation.sku)
            .bind(&variation.thickness)
            .bind(&variation.size)
            .bind(&variation.finish)
            .bind(&variation.color_tone)
            .bind(variation.pack_size)
            .bind(variation.pcs)
            .bind(variation.stock)
            .bind(variation.price)
            .bind(variation.per_m2)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM storefront.variation WHERE product_id = $1 AND uuid <> ALL($2)")
            .bind(id)
            .bind(&kept)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM storefront.image WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_images(&mut tx, ImageOwner::Product(id), &seed.images).await?;

        tx.commit().await?;
        Ok(id)
    }
}

/// Copy `variations`, giving every one without a uuid a fresh v4 uuid.
#[must_use]
pub fn with_assigned_uuids(variations: &[Variation]) -> Vec<Variation> {
    variations
        .iter()
        .map(|variation| Variation {
            uuid: Some(variation.uuid.unwrap_or_else(Uuid::new_v4)),
            ..variation.clone()
        })
        .collect()
}

#[derive(Clone, Copy)]
enum ImageOwner {
    Category(CategoryId),
    Product(ProductId),
}

async fn insert_images(
    tx: &mut Transaction<'_, Postgres>,
    owner: ImageOwner,
    images: &[ImageSeed],
) -> Result<(), RepositoryError> {
    let (category_id, product_id) = match owner {
        ImageOwner::Category(id) => (Some(id), None),
        ImageOwner::Product(id) => (None, Some(id)),
    };

    for (position, image) in (0_i32..).zip(images) {
        sqlx::query(
            r"
            INSERT INTO storefront.image (category_id, product_id, url, alt, position)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(category_id)
        .bind(product_id)
        .bind(&image.url)
        .bind(&image.alt)
        .bind(position)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
