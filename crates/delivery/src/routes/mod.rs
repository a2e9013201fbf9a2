//! HTTP routes for the delivery service.
//!
//! ```text
//! GET  /                                - Banner
//! GET  /api/delivery/{postcode}         - Prices for a postcode
//! POST /api/delivery                    - Upsert {postcode, economy, premium}
//! PUT  /api/delivery/{postcode}         - Update {economy, premium}
//! GET  /api/delivery/search/{prefix}    - Postcodes starting with a prefix
//! ```

pub mod delivery;

use axum::{
    Router,
    routing::{get, post},
};
use sqlx::PgPool;

/// Banner served at `/`.
pub const BANNER: &str = "Delivery Service API running!";

pub fn routes() -> Router<PgPool> {
    Router::new()
        .route("/", get(|| async { BANNER }))
        .route("/api/delivery", post(delivery::upsert))
        .route("/api/delivery/search/{prefix}", get(delivery::search))
        .route(
            "/api/delivery/{postcode}",
            get(delivery::show).put(delivery::update),
        )
}
