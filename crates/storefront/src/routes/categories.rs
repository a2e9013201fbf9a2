//! Category page handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use flagstone_core::{FilterCounts, OptionCounts};

use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalUser;
use crate::models::catalog::{CategoryDetail, CategorySummary, Image, ProductCard, SeoMeta};
use crate::services::catalog::CategoryQuery;
use crate::state::AppState;

/// Products per category page.
pub const PRODUCTS_PER_PAGE: usize = 10;

/// Image display data for templates.
#[derive(Clone)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
}

impl From<&Image> for ImageView {
    fn from(image: &Image) -> Self {
        Self {
            url: image.url.clone(),
            alt: image.alt.clone().unwrap_or_default(),
        }
    }
}

/// Category tile on the index page.
#[derive(Clone)]
pub struct CategoryTileView {
    pub name: String,
    pub slug: String,
    pub discount: Option<String>,
    pub image: Option<ImageView>,
}

impl From<&CategorySummary> for CategoryTileView {
    fn from(category: &CategorySummary) -> Self {
        Self {
            name: category.name.clone(),
            slug: category.slug.clone(),
            discount: (!category.category_discount.is_zero())
                .then(|| format!("{}% off", category.category_discount.normalize())),
            image: category.images.first().map(ImageView::from),
        }
    }
}

/// Product card on a category page.
#[derive(Clone)]
pub struct ProductCardView {
    pub name: String,
    pub slug: String,
    pub image: Option<ImageView>,
    pub per_m2: Option<String>,
    pub details: Vec<String>,
}

impl From<&ProductCard> for ProductCardView {
    fn from(card: &ProductCard) -> Self {
        let variation = card.variation.as_ref();
        let details = variation
            .map(|v| {
                [&v.finish, &v.size, &v.thickness, &v.color_tone]
                    .into_iter()
                    .filter_map(|field| field.clone())
                    .filter(|value| !value.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: card.product.name.clone(),
            slug: card.product.slug.clone(),
            image: card.product.images.first().map(ImageView::from),
            per_m2: variation
                .and_then(|v| v.per_m2)
                .map(filters::format_pounds),
            details,
        }
    }
}

/// One selectable option of a facet in the sidebar.
#[derive(Clone)]
pub struct FacetOptionView {
    pub label: String,
    pub count: u32,
    pub active: bool,
    /// Link toggling this option, resetting to the first page.
    pub url: String,
}

/// A facet group in the sidebar.
#[derive(Clone)]
pub struct FacetGroupView {
    pub title: &'static str,
    pub options: Vec<FacetOptionView>,
}

#[derive(Clone)]
pub struct PageLinkView {
    pub number: usize,
    pub url: String,
    pub current: bool,
}

/// SEO fields rendered in the page head.
#[derive(Clone, Default)]
pub struct SeoView {
    pub title: String,
    pub description: Option<String>,
    pub canonical: Option<String>,
    pub robots: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    pub schemas: Option<String>,
}

impl SeoView {
    fn for_category(name: &str, seo: Option<&SeoMeta>, noindex: bool) -> Self {
        let seo = seo.cloned().unwrap_or_default();
        Self {
            title: seo.meta_title.unwrap_or_else(|| name.to_string()),
            description: seo.meta_description,
            canonical: seo.canonical_tag,
            robots: if noindex {
                Some("noindex, follow".to_string())
            } else {
                seo.robots
            },
            og_title: seo.og_title,
            og_description: seo.og_description,
            og_image: seo.og_image,
            schemas: seo.schemas.map(|value| value.to_string()),
        }
    }
}

/// Category listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub categories: Vec<CategoryTileView>,
    pub signed_in: bool,
}

/// Category detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/show.html")]
pub struct CategoryShowTemplate {
    pub name: String,
    pub slug: String,
    pub short_description: Option<String>,
    pub banner: Option<ImageView>,
    pub seo: SeoView,
    pub products: Vec<ProductCardView>,
    pub facets: Vec<FacetGroupView>,
    pub total_products: usize,
    pub current_page: usize,
    pub total_pages: usize,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
    pub pages: Vec<PageLinkView>,
    pub signed_in: bool,
}

/// Display the category grid.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>, OptionalUser(user): OptionalUser) -> Response {
    let categories = match state.catalog().categories().await {
        Ok(list) => list.iter().map(CategoryTileView::from).collect(),
        Err(e) => {
            tracing::error!("Failed to load categories: {e}");
            Vec::new()
        }
    };

    CategoriesIndexTemplate {
        categories,
        signed_in: user.is_some(),
    }
    .into_response()
}

/// Display one page of a category.
///
/// `?page=1` redirects to the bare URL; pages after the first are marked
/// `noindex, follow`.
#[instrument(skip(state, query))]
pub async fn show(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Path(slug): Path<String>,
    Query(query): Query<CategoryQuery>,
) -> Result<Response, AppError> {
    if query.page == Some(1) {
        let url = page_url(&slug, &query.filter_pairs(), 1);
        return Ok(Redirect::permanent(&url).into_response());
    }

    let current_page = query.page.unwrap_or(1).max(1);
    let filters = query.filters()?;
    let Some(offset) = page_offset(current_page) else {
        return Ok((StatusCode::NOT_FOUND, "Page not found").into_response());
    };

    let Some(detail) = state
        .catalog()
        .category_detail(&slug, &filters, offset, PRODUCTS_PER_PAGE)
        .await?
    else {
        return Ok((StatusCode::NOT_FOUND, "Category not found").into_response());
    };

    Ok(render_category(&detail, &query, current_page, user.is_some()).into_response())
}

fn render_category(
    detail: &CategoryDetail,
    query: &CategoryQuery,
    current_page: usize,
    signed_in: bool,
) -> CategoryShowTemplate {
    let active = query.filter_pairs();
    let total_pages = total_pages(detail.total_products);

    let pages = (1..=total_pages)
        .map(|number| PageLinkView {
            number,
            url: page_url(&detail.slug, &active, number),
            current: number == current_page,
        })
        .collect();

    CategoryShowTemplate {
        name: detail.name.clone(),
        slug: detail.slug.clone(),
        short_description: detail.short_description.clone(),
        banner: detail.images.first().map(ImageView::from),
        seo: SeoView::for_category(&detail.name, detail.seo.as_ref(), current_page > 1),
        products: detail.products.iter().map(ProductCardView::from).collect(),
        facets: facet_groups(&detail.slug, &detail.filter_counts, &active),
        total_products: detail.total_products,
        current_page,
        total_pages,
        prev_url: (current_page > 1).then(|| page_url(&detail.slug, &active, current_page - 1)),
        next_url: (current_page < total_pages)
            .then(|| page_url(&detail.slug, &active, current_page + 1)),
        pages,
        signed_in,
    }
}

/// Offset of the first product on `page` (1-based), or `None` when the page
/// lies beyond any addressable product.
#[must_use]
pub const fn page_offset(page: usize) -> Option<usize> {
    page.saturating_sub(1).checked_mul(PRODUCTS_PER_PAGE)
}

/// Number of pages for `total_products`, at least one.
#[must_use]
pub const fn total_pages(total_products: usize) -> usize {
    if total_products == 0 {
        1
    } else {
        total_products.div_ceil(PRODUCTS_PER_PAGE)
    }
}

/// URL of a category page keeping the active filters.
#[must_use]
pub fn page_url(slug: &str, filters: &[(&str, &str)], page: usize) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in filters {
        query.append_pair(key, value);
    }
    if page > 1 {
        query.append_pair("page", &page.to_string());
    }
    let query = query.finish();

    if query.is_empty() {
        format!("/product-category/{slug}")
    } else {
        format!("/product-category/{slug}?{query}")
    }
}

fn facet_groups(
    slug: &str,
    counts: &FilterCounts,
    active: &[(&'static str, &str)],
) -> Vec<FacetGroupView> {
    let groups: [(&'static str, &'static str, &OptionCounts); 7] = [
        ("Price", "price", &counts.price),
        ("Colour", "colorTone", &counts.color_tone),
        ("Finish", "finish", &counts.finish),
        ("Thickness", "thickness", &counts.thickness),
        ("Size", "size", &counts.size),
        ("Pieces", "pcs", &counts.pcs),
        ("Pack size (m²)", "packSize", &counts.pack_size),
    ];

    groups
        .into_iter()
        .map(|(title, key, options)| FacetGroupView {
            title,
            options: options
                .iter()
                .map(|(label, count)| {
                    let is_active = active
                        .iter()
                        .any(|(k, v)| *k == key && *v == label.as_str());
                    let mut next: Vec<(&str, &str)> =
                        active.iter().filter(|(k, _)| *k != key).copied().collect();
                    if !is_active {
                        next.push((key, label.as_str()));
                    }
                    FacetOptionView {
                        label: label.clone(),
                        count: *count,
                        active: is_active,
                        url: page_url(slug, &next, 1),
                    }
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_uses_total_products() {
        assert_eq!(total_pages(0), 1);
        assert_eq!(total_pages(10), 1);
        assert_eq!(total_pages(11), 2);
        assert_eq!(total_pages(35), 4);
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1), Some(0));
        assert_eq!(page_offset(3), Some(20));
        assert_eq!(page_offset(usize::MAX), None);
    }

    #[test]
    fn test_page_url_keeps_filters_and_drops_first_page() {
        assert_eq!(page_url("sandstone", &[], 1), "/product-category/sandstone");
        assert_eq!(
            page_url("sandstone", &[("colorTone", "Buff Mix"), ("price", "0-200")], 3),
            "/product-category/sandstone?colorTone=Buff+Mix&price=0-200&page=3"
        );
    }

    #[test]
    fn test_facet_option_toggles_filter() {
        let mut counts = FilterCounts::default();
        counts.finish.insert("Riven".to_string(), 4);
        counts.finish.insert("Honed".to_string(), 2);

        let groups = facet_groups("slate", &counts, &[("finish", "Riven")]);
        let finish = groups.iter().find(|g| g.title == "Finish").unwrap();

        let riven = finish.options.iter().find(|o| o.label == "Riven").unwrap();
        assert!(riven.active);
        assert_eq!(riven.url, "/product-category/slate");

        let honed = finish.options.iter().find(|o| o.label == "Honed").unwrap();
        assert!(!honed.active);
        assert_eq!(honed.url, "/product-category/slate?finish=Honed");
    }

    #[test]
    fn test_later_pages_are_noindex() {
        let seo = SeoView::for_category("Slate", None, true);
        assert_eq!(seo.robots.as_deref(), Some("noindex, follow"));
        assert_eq!(seo.title, "Slate");
    }
}
