//! Persistent cart API. Every route requires a signed-in user.

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};
use tracing::instrument;

use flagstone_core::CartItemId;

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::cart::{AddToCart, CartItem, CartLine, UpdateQuantity};
use crate::services::cart::CartService;
use crate::state::AppState;

/// `POST /api/cart/add`
#[instrument(skip(state, body))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Json(body): Json<AddToCart>,
) -> Result<Json<CartItem>> {
    let line = CartService::new(state.pool(), state.cache())
        .add(user_id, body)
        .await?;
    Ok(Json(line))
}

/// `GET /api/cart`
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Json<Vec<CartLine>>> {
    let lines = CartService::new(state.pool(), state.cache())
        .list(user_id)
        .await?;
    Ok(Json(lines))
}

/// `PUT /api/cart/{id}`
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(id): Path<CartItemId>,
    Json(body): Json<UpdateQuantity>,
) -> Result<Json<CartItem>> {
    let line = CartService::new(state.pool(), state.cache())
        .update(user_id, id, body)
        .await?;
    Ok(Json(line))
}

/// `DELETE /api/cart/{id}`
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(id): Path<CartItemId>,
) -> Result<Json<Value>> {
    CartService::new(state.pool(), state.cache())
        .remove(user_id, id)
        .await?;
    Ok(Json(json!({ "ok": true })))
}
