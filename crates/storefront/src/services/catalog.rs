//! Catalog reads with an in-process cache.
//!
//! Category pages are filtered and counted in memory, so a whole category
//! (every product, variation and image) is cached as one value and each
//! filtered request is served from it.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{debug, instrument};

use flagstone_core::facets::RawFacetQuery;
use flagstone_core::{FacetError, FacetFilters, compute_filter_counts, filter_products};

use crate::db::RepositoryError;
use crate::db::catalog::CategoryRepository;
use crate::models::catalog::{Category, CategoryDetail, CategorySummary, ProductCard};

/// Products per page of `GET /api/category/{slug}` when no limit is given.
pub const DEFAULT_PAGE_LIMIT: usize = 12;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Categories,
    Category(String),
}

#[derive(Debug, Clone)]
enum CacheValue {
    Categories(Arc<Vec<CategorySummary>>),
    Category(Arc<Category>),
}

/// Query string of a category page: facet filters plus paging.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryQuery {
    pub price: Option<String>,
    pub color_tone: Option<String>,
    pub finish: Option<String>,
    pub thickness: Option<String>,
    pub size: Option<String>,
    pub pcs: Option<String>,
    pub pack_size: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    /// Page number, used by the HTML pages only.
    pub page: Option<usize>,
}

impl CategoryQuery {
    /// Parse the facet part of the query.
    ///
    /// # Errors
    ///
    /// Returns `FacetError` for a malformed price range, piece count or pack size.
    pub fn filters(&self) -> Result<FacetFilters, FacetError> {
        FacetFilters::from_query(&RawFacetQuery {
            price: self.price.as_deref(),
            color_tone: self.color_tone.as_deref(),
            finish: self.finish.as_deref(),
            thickness: self.thickness.as_deref(),
            size: self.size.as_deref(),
            pcs: self.pcs.as_deref(),
            pack_size: self.pack_size.as_deref(),
        })
    }

    /// Active filters as query pairs, for building pagination links.
    #[must_use]
    pub fn filter_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("price", self.price.as_deref()),
            ("colorTone", self.color_tone.as_deref()),
            ("finish", self.finish.as_deref()),
            ("thickness", self.thickness.as_deref()),
            ("size", self.size.as_deref()),
            ("pcs", self.pcs.as_deref()),
            ("packSize", self.pack_size.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (key, v))
        })
        .collect()
    }
}

/// Catalog read service.
///
/// Cheaply cloneable; clones share the cache.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogServiceInner>,
}

struct CatalogServiceInner {
    pool: PgPool,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogService {
    #[must_use]
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(500).time_to_live(ttl).build();
        Self {
            inner: Arc::new(CatalogServiceInner { pool, cache }),
        }
    }

    /// All categories, distinct by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database query fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Arc<Vec<CategorySummary>>, RepositoryError> {
        if let Some(CacheValue::Categories(list)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(list);
        }

        let list = Arc::new(CategoryRepository::new(&self.inner.pool).list().await?);
        self.inner
            .cache
            .insert(CacheKey::Categories, CacheValue::Categories(Arc::clone(&list)))
            .await;
        Ok(list)
    }

    /// A whole category with all of its products, or `None` for an unknown slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database query fails.
    #[instrument(skip(self))]
    pub async fn category(&self, slug: &str) -> Result<Option<Arc<Category>>, RepositoryError> {
        let key = CacheKey::Category(slug.to_string());
        if let Some(CacheValue::Category(category)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for category");
            return Ok(Some(category));
        }

        let Some(category) = CategoryRepository::new(&self.inner.pool)
            .find_by_slug(slug)
            .await?
        else {
            return Ok(None);
        };

        let category = Arc::new(category);
        self.inner
            .cache
            .insert(key, CacheValue::Category(Arc::clone(&category)))
            .await;
        Ok(Some(category))
    }

    /// One filtered page of a category with its facet counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database query fails.
    pub async fn category_detail(
        &self,
        slug: &str,
        filters: &FacetFilters,
        offset: usize,
        limit: usize,
    ) -> Result<Option<CategoryDetail>, RepositoryError> {
        Ok(self
            .category(slug)
            .await?
            .map(|category| build_category_detail(&category, filters, offset, limit)))
    }

    /// Drop every cached catalog entry.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

/// Filter a category's products, count facets and cut out one page.
///
/// Facet counts are taken over the unfiltered product list; each dimension
/// ignores its own active filter.
#[must_use]
pub fn build_category_detail(
    category: &Category,
    filters: &FacetFilters,
    offset: usize,
    limit: usize,
) -> CategoryDetail {
    let filtered = filter_products(&category.products, filters);
    let filter_counts = compute_filter_counts(&category.products, filters);

    CategoryDetail {
        name: category.name.clone(),
        slug: category.slug.clone(),
        category_discount: category.category_discount,
        short_description: category.short_description.clone(),
        images: category.images.clone(),
        total_products: filtered.len(),
        products: filtered
            .iter()
            .skip(offset)
            .take(limit)
            .map(ProductCard::from)
            .collect(),
        seo: category.seo.clone(),
        filter_counts,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use flagstone_core::{CategoryId, ProductId, Variation};

    use super::*;
    use crate::models::catalog::Product;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn product(id: i32, variations: Vec<Variation>) -> Product {
        Product {
            id: ProductId::new(id),
            category_id: CategoryId::new(1),
            name: format!("Product {id}"),
            slug: format!("product-{id}"),
            product_discount: Decimal::ZERO,
            images: Vec::new(),
            variations,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn variation(finish: &str, price: &str) -> Variation {
        Variation {
            finish: Some(finish.to_string()),
            price: Some(d(price)),
            ..Variation::default()
        }
    }

    fn category() -> Category {
        Category {
            id: CategoryId::new(1),
            name: "Porcelain Paving".to_string(),
            slug: "porcelain-paving".to_string(),
            short_description: None,
            category_discount: d("10"),
            images: Vec::new(),
            seo: None,
            products: (1..=5)
                .map(|i| {
                    let finish = if i % 2 == 0 { "Honed" } else { "Riven" };
                    product(i, vec![variation(finish, "250"), variation("Sawn", "900")])
                })
                .collect(),
        }
    }

    #[test]
    fn test_detail_pages_filtered_products() {
        let query = CategoryQuery {
            finish: Some("Riven".to_string()),
            ..CategoryQuery::default()
        };
        let filters = query.filters().unwrap();

        let detail = build_category_detail(&category(), &filters, 1, 1);

        assert_eq!(detail.total_products, 3);
        assert_eq!(detail.products.len(), 1);
        assert_eq!(detail.products[0].product.id, ProductId::new(3));
        let shown = detail.products[0].variation.as_ref().unwrap();
        assert_eq!(shown.finish.as_deref(), Some("Riven"));
    }

    #[test]
    fn test_detail_counts_ignore_own_filter() {
        let query = CategoryQuery {
            finish: Some("Riven".to_string()),
            ..CategoryQuery::default()
        };
        let detail = build_category_detail(&category(), &query.filters().unwrap(), 0, 12);

        // Finish counts see every finish; price counts only see Riven.
        assert_eq!(detail.filter_counts.finish["Honed"], 2);
        assert_eq!(detail.filter_counts.finish["Sawn"], 5);
        assert_eq!(detail.filter_counts.price["200-300"], 3);
        assert_eq!(detail.filter_counts.price["500-1000"], 0);
    }

    #[test]
    fn test_offset_past_end_is_empty() {
        let detail = build_category_detail(&category(), &FacetFilters::default(), 50, 12);
        assert_eq!(detail.total_products, 5);
        assert!(detail.products.is_empty());
    }

    #[test]
    fn test_malformed_price_is_rejected() {
        let query = CategoryQuery {
            price: Some("cheap".to_string()),
            ..CategoryQuery::default()
        };
        assert!(query.filters().is_err());
    }

    #[test]
    fn test_filter_pairs_skip_blank_values() {
        let query = CategoryQuery {
            color_tone: Some("Grey".to_string()),
            finish: Some("  ".to_string()),
            page: Some(2),
            ..CategoryQuery::default()
        };
        assert_eq!(query.filter_pairs(), vec![("colorTone", "Grey")]);
    }
}
