//! Profile details API.

use axum::{Json, extract::State};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::user::{Me, UserDetails, UserDetailsUpdate};
use crate::services::auth::AuthService;
use crate::services::user_details::UserDetailsService;
use crate::state::AppState;

/// Load the signed-in user with their details.
pub(crate) async fn load_me(state: &AppState, user_id: flagstone_core::UserId) -> Result<Me> {
    let user = AuthService::new(state.pool()).get_user(user_id).await?;
    let details = UserDetailsService::new(state.pool(), state.cache())
        .get(user_id)
        .await?;
    Ok(Me::new(user, details))
}

/// `GET /api/user-details/me`
#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Json<Me>> {
    Ok(Json(load_me(&state, user_id).await?))
}

/// `GET /api/user-details/redis`
#[instrument(skip(state))]
pub async fn cached(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Json<UserDetails>> {
    let details = UserDetailsService::new(state.pool(), state.cache())
        .cached(user_id)
        .await?;
    Ok(Json(details))
}

/// `PUT /api/user-details`
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Json(body): Json<UserDetailsUpdate>,
) -> Result<Json<UserDetails>> {
    let details = UserDetailsService::new(state.pool(), state.cache())
        .update(user_id, body)
        .await?;
    Ok(Json(details))
}

/// `DELETE /api/user-details/redis/clear`
#[instrument(skip(state))]
pub async fn clear_cached(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Json<Value>> {
    UserDetailsService::new(state.pool(), state.cache())
        .invalidate(user_id)
        .await?;
    Ok(Json(json!({ "ok": true })))
}
