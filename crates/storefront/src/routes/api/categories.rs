//! Catalog API.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::catalog::{CategoryDetail, CategorySummary};
use crate::services::catalog::{CategoryQuery, DEFAULT_PAGE_LIMIT};
use crate::state::AppState;

/// `GET /api/categories`
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<CategorySummary>>> {
    let categories = state.catalog().categories().await?;
    Ok(Json(Vec::clone(&categories)))
}

/// `GET /api/category/{slug}`
///
/// Filters by the facet query parameters and returns the page
/// `[offset, offset + limit)` with counts for every facet.
#[instrument(skip(state, query))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<CategoryDetail>> {
    let filters = query.filters()?;
    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

    state
        .catalog()
        .category_detail(&slug, &filters, offset, limit)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
}
