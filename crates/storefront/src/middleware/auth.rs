//! Authentication extractors and token cookie helpers.
//!
//! A request is authenticated by a token in `Authorization: Bearer <token>`
//! or, failing that, in the `token` cookie set at login.

use std::time::Duration;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tower_sessions::cookie::{Cookie, SameSite};

use flagstone_core::UserId;

use crate::services::auth::TOKEN_COOKIE;
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// API requests without a valid token get 401; page requests are redirected
/// to `/login`.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireUser(user_id): RequireUser) -> String {
///     format!("Hello, user {user_id}!")
/// }
/// ```
pub struct RequireUser(pub UserId);

/// Error returned when authentication is required but the user is not signed in.
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Authentication required" })),
            )
                .into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).map(Self).ok_or_else(|| {
            if parts.uri.path().starts_with("/api/") {
                AuthRejection::Unauthorized
            } else {
                AuthRejection::RedirectToLogin
            }
        })
    }
}

/// Extractor that optionally gets the signed-in user.
///
/// Unlike `RequireUser`, this does not reject the request.
pub struct OptionalUser(pub Option<UserId>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(authenticate(parts, state)))
    }
}

fn authenticate(parts: &Parts, state: &AppState) -> Option<UserId> {
    let token = token_from_parts(parts)?;
    match state.jwt().verify(&token) {
        Ok(user_id) => {
            tracing::Span::current().record("user_id", user_id.as_i32());
            Some(user_id)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Rejected token");
            None
        }
    }
}

/// The bearer token, or the `token` cookie when there is no bearer token.
#[must_use]
pub fn token_from_parts(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == TOKEN_COOKIE && !c.value().is_empty())
        .map(|c| c.value().to_string())
}

/// `Set-Cookie` value carrying a freshly issued token.
#[must_use]
pub fn token_cookie(token: &str, ttl: Duration, secure: bool) -> Option<HeaderValue> {
    let max_age = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    let cookie = Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(tower_sessions::cookie::time::Duration::seconds(max_age))
        .build();
    HeaderValue::from_str(&cookie.to_string()).ok()
}

/// `Set-Cookie` value that removes the token cookie.
#[must_use]
pub fn clear_token_cookie(secure: bool) -> Option<HeaderValue> {
    let cookie = Cookie::build((TOKEN_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(tower_sessions::cookie::time::Duration::ZERO)
        .build();
    HeaderValue::from_str(&cookie.to_string()).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/api/cart");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_wins_over_cookie() {
        let parts = parts(&[
            ("authorization", "Bearer abc"),
            ("cookie", "token=def"),
        ]);
        assert_eq!(token_from_parts(&parts).as_deref(), Some("abc"));
    }

    #[test]
    fn test_token_read_from_cookie() {
        let parts = parts(&[("cookie", "theme=dark; token=def; other=1")]);
        assert_eq!(token_from_parts(&parts).as_deref(), Some("def"));
    }

    #[test]
    fn test_no_token() {
        assert!(token_from_parts(&parts(&[])).is_none());
        assert!(token_from_parts(&parts(&[("authorization", "Basic xyz")])).is_none());
        assert!(token_from_parts(&parts(&[("cookie", "token=")])).is_none());
    }

    #[test]
    fn test_token_cookie_attributes() {
        let value = token_cookie("abc", Duration::from_secs(60), true).unwrap();
        let value = value.to_str().unwrap();
        assert!(value.starts_with("token=abc"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("Secure"));
        assert!(value.contains("SameSite=Lax"));
        assert!(value.contains("Max-Age=60"));

        let cleared = clear_token_cookie(false).unwrap();
        let cleared = cleared.to_str().unwrap();
        assert!(cleared.contains("Max-Age=0"));
        assert!(!cleared.contains("Secure"));
    }
}
