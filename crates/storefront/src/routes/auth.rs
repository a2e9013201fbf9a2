//! Login and logout pages.
//!
//! The form posts back to `/login`; on success the token cookie is set and
//! the browser is sent to `/account`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{StatusCode, header},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::OptionalUser;
use crate::middleware::auth::{clear_token_cookie, token_cookie};
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub identifier: String,
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub identifier: String,
    pub error: Option<String>,
    pub signed_in: bool,
}

/// Display the login page; signed-in users go straight to their account.
pub async fn login_page(OptionalUser(user): OptionalUser) -> Response {
    if user.is_some() {
        return Redirect::to("/account").into_response();
    }
    LoginTemplate {
        identifier: String::new(),
        error: None,
        signed_in: false,
    }
    .into_response()
}

/// Handle the login form.
#[instrument(skip(state, form))]
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let result = AuthService::new(state.pool())
        .login(&form.identifier, &form.password)
        .await
        .and_then(|user| Ok((state.jwt().issue(user.id)?, user)));

    match result {
        Ok((token, user)) => {
            set_sentry_user(&user.id, Some(user.email.as_str()));
            tracing::info!(user_id = %user.id, "User logged in");
            let cookie = token_cookie(&token, state.jwt().ttl(), state.config().secure_cookies());
            (
                AppendHeaders(cookie.map(|value| (header::SET_COOKIE, value))),
                Redirect::to("/account"),
            )
                .into_response()
        }
        Err(AuthError::InvalidCredentials) => (
            StatusCode::UNAUTHORIZED,
            LoginTemplate {
                identifier: form.identifier,
                error: Some("Invalid email, username or password".to_string()),
                signed_in: false,
            },
        )
            .into_response(),
        Err(e) => AppError::from(e).into_response(),
    }
}

/// Clear the token cookie and return to the home page.
pub async fn logout(State(state): State<AppState>) -> Response {
    clear_sentry_user();
    let cookie = clear_token_cookie(state.config().secure_cookies());
    (
        AppendHeaders(cookie.map(|value| (header::SET_COOKIE, value))),
        Redirect::to("/"),
    )
        .into_response()
}
