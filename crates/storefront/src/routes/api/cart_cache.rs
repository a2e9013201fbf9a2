//! Cache-only cart API, keyed per user with a one hour TTL.

use axum::{Json, extract::State};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::cart::{AddToCart, CachedCartLine};
use crate::services::cart::CartService;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CachedCartResponse {
    pub ok: bool,
    pub cart: Vec<CachedCartLine>,
}

/// `GET /api/cart/redis`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Json<Vec<CachedCartLine>>> {
    let cart = CartService::new(state.pool(), state.cache())
        .cached(user_id)
        .await?;
    Ok(Json(cart))
}

/// `POST /api/cart/redis/add`
#[instrument(skip(state, body))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Json(body): Json<AddToCart>,
) -> Result<Json<CachedCartResponse>> {
    let cart = CartService::new(state.pool(), state.cache())
        .add_cached(user_id, body)
        .await?;
    Ok(Json(CachedCartResponse { ok: true, cart }))
}

/// `DELETE /api/cart/redis/clear`
#[instrument(skip(state))]
pub async fn clear(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Json<Value>> {
    CartService::new(state.pool(), state.cache())
        .clear_cached(user_id)
        .await?;
    Ok(Json(json!({ "ok": true })))
}
