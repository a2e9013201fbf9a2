//! Postcode price handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::instrument;

use flagstone_core::{Postcode, normalize_prefix};

use crate::db::{PostcodePrice, PostcodeRepository, Upserted};
use crate::error::{DeliveryError, Result};

/// Body of `POST /api/delivery`.
#[derive(Debug, Deserialize)]
pub struct UpsertRequest {
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub economy: Option<Decimal>,
    #[serde(default)]
    pub premium: Option<Decimal>,
}

/// Body of `PUT /api/delivery/{postcode}`.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub economy: Option<Decimal>,
    #[serde(default)]
    pub premium: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

const MISSING_FIELDS: &str = "Missing fields";

/// `GET /api/delivery/{postcode}`
#[instrument(skip(pool))]
pub async fn show(
    State(pool): State<PgPool>,
    Path(postcode): Path<String>,
) -> Result<Json<PostcodePrice>> {
    let postcode = Postcode::parse(&postcode)?;
    PostcodeRepository::new(&pool)
        .find(&postcode)
        .await?
        .map(Json)
        .ok_or_else(|| DeliveryError::NotFound("Postcode not found".to_string()))
}

/// `POST /api/delivery`
#[instrument(skip(pool, body))]
pub async fn upsert(
    State(pool): State<PgPool>,
    body: std::result::Result<Json<UpsertRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(body) = body.map_err(|e| DeliveryError::BadRequest(e.body_text()))?;
    let (Some(postcode), Some(economy), Some(premium)) =
        (body.postcode.as_deref(), body.economy, body.premium)
    else {
        return Err(DeliveryError::BadRequest(MISSING_FIELDS.to_string()));
    };
    let postcode = Postcode::parse(postcode)?;

    let outcome = PostcodeRepository::new(&pool)
        .upsert(&postcode, economy, premium)
        .await?;
    tracing::info!(%postcode, inserted = (outcome == Upserted::Inserted), "Postcode prices saved");

    Ok(Json(MessageResponse {
        message: "Inserted/Updated successfully",
    }))
}

/// `PUT /api/delivery/{postcode}`
#[instrument(skip(pool, body))]
pub async fn update(
    State(pool): State<PgPool>,
    Path(postcode): Path<String>,
    body: std::result::Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(body) = body.map_err(|e| DeliveryError::BadRequest(e.body_text()))?;
    let (Some(economy), Some(premium)) = (body.economy, body.premium) else {
        return Err(DeliveryError::BadRequest(MISSING_FIELDS.to_string()));
    };
    let postcode = Postcode::parse(&postcode)?;

    if !PostcodeRepository::new(&pool)
        .update(&postcode, economy, premium)
        .await?
    {
        return Err(DeliveryError::NotFound("Postcode not found".to_string()));
    }
    tracing::info!(%postcode, "Postcode prices updated");

    Ok(Json(MessageResponse {
        message: "Updated successfully",
    }))
}

/// `GET /api/delivery/search/{prefix}`
#[instrument(skip(pool))]
pub async fn search(
    State(pool): State<PgPool>,
    Path(prefix): Path<String>,
) -> Result<Json<Vec<PostcodePrice>>> {
    let prefix = normalize_prefix(&prefix);
    let rows = PostcodeRepository::new(&pool).search_prefix(&prefix).await?;
    if rows.is_empty() {
        return Err(DeliveryError::NotFound("No records found".to_string()));
    }
    Ok(Json(rows))
}
