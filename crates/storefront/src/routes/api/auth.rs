//! Local account API: register, log in, log out and whoami.
//!
//! Successful register and login responses carry the token in the body and
//! in an http-only `token` cookie.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::OptionalUser;
use crate::middleware::auth::{clear_token_cookie, token_cookie};
use crate::models::user::User;
use crate::services::auth::AuthService;
use crate::state::AppState;

use super::user_details::load_me;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email or username.
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub jwt: String,
    pub user: User,
}

/// Issue a token for `user` and build the response with its cookie.
pub(crate) fn signed_in(state: &AppState, user: User) -> Result<(HeaderMap, Json<AuthResponse>)> {
    let jwt = state.jwt().issue(user.id)?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    let mut headers = HeaderMap::new();
    if let Some(cookie) = token_cookie(&jwt, state.jwt().ttl(), state.config().secure_cookies()) {
        headers.insert(header::SET_COOKIE, cookie);
    }
    Ok((headers, Json(AuthResponse { jwt, user })))
}

/// `POST /api/auth/local/register`
#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>)> {
    let user = AuthService::new(state.pool())
        .register(&body.username, &body.email, &body.password)
        .await?;
    tracing::info!(user_id = %user.id, "User registered");
    signed_in(&state, user)
}

/// `POST /api/auth/local`
#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>)> {
    let user = AuthService::new(state.pool())
        .login(&body.identifier, &body.password)
        .await?;
    tracing::info!(user_id = %user.id, "User logged in");
    signed_in(&state, user)
}

/// `POST /api/auth/logout`
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    clear_sentry_user();
    let mut headers = HeaderMap::new();
    if let Some(cookie) = clear_token_cookie(state.config().secure_cookies()) {
        headers.insert(header::SET_COOKIE, cookie);
    }
    (headers, Json(json!({ "ok": true })))
}

/// `GET /api/auth/me`
#[instrument(skip(state))]
pub async fn me(State(state): State<AppState>, OptionalUser(user_id): OptionalUser) -> Result<Response> {
    let Some(user_id) = user_id else {
        return Ok((StatusCode::UNAUTHORIZED, Json(json!({ "user": null }))).into_response());
    };
    Ok(Json(load_me(&state, user_id).await?).into_response())
}
