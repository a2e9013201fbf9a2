//! Seed the catalog from a YAML file.
//!
//! The file is a list of categories, each with its products and their
//! variations:
//!
//! ```yaml
//! - name: Indian Sandstone
//!   slug: indian-sandstone
//!   category_discount: 10
//!   products:
//!     - name: Kandla Grey
//!       slug: kandla-grey
//!       variations:
//!         - SKU: KG-600
//!           ColorTone: Grey
//!           Per_m2: 34.99
//!           PackSize: 1.44
//! ```
//!
//! Seeding is idempotent: categories and products are matched by slug and
//! variations keep their uuids.

use std::path::Path;

use tracing::{info, warn};

use flagstone_storefront::db::{self, CategoryRepository, ProductRepository};
use flagstone_storefront::models::catalog::CategorySeed;

use super::database_url;

/// Upsert every category and product in `file`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the database
/// is unreachable. A product that fails to save is logged and skipped.
pub async fn catalog(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = database_url("STOREFRONT_DATABASE_URL")?;

    info!(path = %file.display(), "Loading catalog seed");

    // Parse before connecting so a bad file fails fast
    let content = tokio::fs::read_to_string(file).await?;
    let categories: Vec<CategorySeed> = serde_yaml::from_str(&content)?;
    validate(&categories)?;
    info!(categories = categories.len(), "Parsed catalog seed");

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let category_repo = CategoryRepository::new(&pool);
    let product_repo = ProductRepository::new(&pool);
    let mut saved = 0;
    let mut failed = 0;

    for category in &categories {
        let category_id = category_repo.upsert(category).await?;

        for product in &category.products {
            match product_repo.save(category_id, product).await {
                Ok(_) => saved += 1,
                Err(e) => {
                    failed += 1;
                    warn!(category = %category.slug, product = %product.slug, error = %e, "Failed to save product");
                }
            }
        }
    }

    info!("Seeding complete!");
    info!("  Categories: {}", categories.len());
    info!("  Products saved: {saved}");
    if failed > 0 {
        warn!("  Products failed: {failed}");
    }

    Ok(())
}

/// Reject seeds with blank or duplicate slugs.
fn validate(categories: &[CategorySeed]) -> Result<(), String> {
    let mut category_slugs = std::collections::HashSet::new();
    let mut product_slugs = std::collections::HashSet::new();

    for category in categories {
        if category.slug.trim().is_empty() {
            return Err(format!("category {:?} has an empty slug", category.name));
        }
        if !category_slugs.insert(category.slug.as_str()) {
            return Err(format!("duplicate category slug {:?}", category.slug));
        }
        for product in &category.products {
            if product.slug.trim().is_empty() {
                return Err(format!("product {:?} has an empty slug", product.name));
            }
            if !product_slugs.insert(product.slug.as_str()) {
                return Err(format!("duplicate product slug {:?}", product.slug));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Vec<CategorySeed> {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_valid_seed() {
        let seed = parse(
            r"
- name: Slate
  slug: slate
  products:
    - name: Brazilian Black
      slug: brazilian-black
- name: Limestone
  slug: limestone
",
        );
        assert!(validate(&seed).is_ok());
    }

    #[test]
    fn test_duplicate_product_slug() {
        let seed = parse(
            r"
- name: Slate
  slug: slate
  products:
    - name: A
      slug: same
- name: Limestone
  slug: limestone
  products:
    - name: B
      slug: same
",
        );
        let err = validate(&seed).unwrap_err();
        assert!(err.contains("duplicate product slug"));
    }

    #[test]
    fn test_blank_category_slug() {
        let seed = parse("- name: Slate\n  slug: ' '\n");
        assert!(validate(&seed).is_err());
    }
}
