//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Pages
//! GET  /                                 - Category grid
//! GET  /product-category                 - Category grid
//! GET  /product-category/{slug}          - Category page (?page, facet filters)
//! GET  /cart                             - Cart page (?postcode for delivery prices)
//! GET  /account                          - Profile (requires auth)
//! GET  /login                            - Login form
//! POST /login                            - Login action
//! POST /logout                           - Logout action
//!
//! # Catalog API
//! GET  /api/categories                   - Category list
//! GET  /api/category/{slug}              - Filtered category page with facet counts
//!
//! # Auth API
//! POST /api/auth/local/register          - Register, returns {jwt, user}
//! POST /api/auth/local                   - Log in, returns {jwt, user}
//! POST /api/auth/logout                  - Clear the token cookie
//! GET  /api/auth/me                      - Current user or {user: null}
//!
//! # Cart API (requires auth)
//! POST   /api/cart/add                   - Add or increment a line
//! GET    /api/cart                       - List lines
//! PUT    /api/cart/{id}                  - Set quantity
//! DELETE /api/cart/{id}                  - Remove line
//! GET    /api/cart/redis                 - Cached cart
//! POST   /api/cart/redis/add             - Merge into cached cart
//! DELETE /api/cart/redis/clear           - Drop cached cart
//!
//! # User details API (requires auth)
//! GET    /api/user-details/me            - User with details
//! GET    /api/user-details/redis         - Cached details
//! PUT    /api/user-details               - Save details
//! DELETE /api/user-details/redis/clear   - Drop cached details
//! POST   /api/upload                     - Multipart upload (field `files`)
//! ```

pub mod account;
pub mod api;
pub mod auth;
pub mod cart;
pub mod categories;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};

use crate::middleware::rate_limit::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Whether per-IP rate limits are applied.
///
/// Limiting needs a client address, from proxy headers or from the socket
/// when served with `into_make_service_with_connect_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimits {
    Enabled,
    Disabled,
}

/// Server-rendered pages.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index))
        .route("/product-category", get(categories::index))
        .route("/product-category/{slug}", get(categories::show))
        .route("/cart", get(cart::show))
        .route("/account", get(account::show))
        .route("/logout", post(auth::logout))
}

/// Login and registration endpoints (pages and API).
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/api/auth/local/register", post(api::auth::register))
        .route("/api/auth/local", post(api::auth::login))
}

/// JSON API endpoints other than login and registration.
pub fn api_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(api::categories::list))
        .route("/api/category/{slug}", get(api::categories::show))
        .route("/api/auth/logout", post(api::auth::logout))
        .route("/api/auth/me", get(api::auth::me))
        .route("/api/cart", get(api::cart::list))
        .route("/api/cart/add", post(api::cart::add))
        .route(
            "/api/cart/{id}",
            put(api::cart::update).delete(api::cart::remove),
        )
        .route("/api/cart/redis", get(api::cart_cache::show))
        .route("/api/cart/redis/add", post(api::cart_cache::add))
        .route("/api/cart/redis/clear", delete(api::cart_cache::clear))
        .route("/api/user-details", put(api::user_details::update))
        .route("/api/user-details/me", get(api::user_details::me))
        .route("/api/user-details/redis", get(api::user_details::cached))
        .route(
            "/api/user-details/redis/clear",
            delete(api::user_details::clear_cached),
        )
        .route(
            "/api/upload",
            post(api::upload::upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

/// All storefront routes.
pub fn routes(max_upload_bytes: usize, limits: RateLimits) -> Router<AppState> {
    let auth = auth_routes();
    let api = api_routes(max_upload_bytes);

    let (auth, api) = match limits {
        RateLimits::Enabled => (auth.layer(auth_rate_limiter()), api.layer(api_rate_limiter())),
        RateLimits::Disabled => (auth, api),
    };

    Router::new().merge(page_routes()).merge(auth).merge(api)
}
