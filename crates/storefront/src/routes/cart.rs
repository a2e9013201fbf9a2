//! Cart page handler.
//!
//! Shows the signed-in user's persistent cart and, for `?postcode=`, the
//! delivery prices quoted by the delivery service.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use flagstone_core::Postcode;

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireUser;
use crate::models::cart::{CartLine, subtotal};
use crate::services::cart::CartService;
use crate::services::delivery::DeliveryQuote;
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub sku: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub low_stock: bool,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.item.id.as_i32(),
            name: line.product.name.clone(),
            slug: line.product.slug.clone(),
            image: line
                .product
                .image
                .clone()
                .or_else(|| line.item.metadata.product_image.clone()),
            sku: line.item.metadata.sku.clone(),
            quantity: line.item.quantity,
            unit_price: line.item.unit_price,
            line_total: line.item.line_total(),
            low_stock: line.stock.is_some_and(|stock| stock < line.item.quantity),
        }
    }
}

/// Outcome of a delivery lookup, as shown on the page.
#[derive(Clone)]
pub enum DeliveryView {
    Quote {
        postcode: String,
        economy: String,
        premium: String,
    },
    NotCovered(String),
    Invalid(String),
    Unavailable,
}

impl From<DeliveryQuote> for DeliveryView {
    fn from(quote: DeliveryQuote) -> Self {
        Self::Quote {
            postcode: quote.postcode,
            economy: filters::format_pounds(quote.economy_price),
            premium: filters::format_pounds(quote.premium_price),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CartPageQuery {
    pub postcode: Option<String>,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub lines: Vec<CartLineView>,
    pub subtotal: Decimal,
    pub postcode: String,
    pub delivery: Option<DeliveryView>,
    pub signed_in: bool,
}

/// Display the cart page.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Query(query): Query<CartPageQuery>,
) -> Result<Response, AppError> {
    let lines = CartService::new(state.pool(), state.cache())
        .list(user_id)
        .await?;

    let postcode = query
        .postcode
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());
    let delivery = match postcode {
        Some(raw) => Some(delivery_view(&state, raw).await),
        None => None,
    };

    Ok(CartShowTemplate {
        subtotal: subtotal(&lines),
        lines: lines.iter().map(CartLineView::from).collect(),
        postcode: postcode.unwrap_or_default().to_string(),
        delivery,
        signed_in: true,
    }
    .into_response())
}

async fn delivery_view(state: &AppState, raw: &str) -> DeliveryView {
    let postcode = match Postcode::parse(raw) {
        Ok(postcode) => postcode,
        Err(e) => return DeliveryView::Invalid(e.to_string()),
    };

    match state.delivery().quote(&postcode).await {
        Ok(Some(quote)) => quote.into(),
        Ok(None) => DeliveryView::NotCovered(postcode.to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "Delivery lookup failed");
            DeliveryView::Unavailable
        }
    }
}
