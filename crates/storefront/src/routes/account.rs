//! Account page handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireUser;
use crate::models::user::UserDetails;
use crate::routes::api::user_details::load_me;
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Account page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/show.html")]
pub struct AccountTemplate {
    pub username: String,
    pub email: String,
    pub details: UserDetails,
    pub signed_in: bool,
}

/// Display the signed-in user's profile.
///
/// A token naming a deleted user is treated as signed out.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Response, AppError> {
    let me = match load_me(&state, user_id).await {
        Ok(me) => me,
        Err(AppError::Auth(AuthError::UserNotFound)) => {
            return Ok(Redirect::to("/login").into_response());
        }
        Err(e) => return Err(e),
    };

    Ok(AccountTemplate {
        username: me.username,
        email: me.email.to_string(),
        details: me.user_details.unwrap_or_default(),
        signed_in: true,
    }
    .into_response())
}
