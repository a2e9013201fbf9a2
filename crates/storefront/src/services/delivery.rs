//! Client for the delivery-pricing service.

use std::time::Duration;

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use flagstone_core::Postcode;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("delivery service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid delivery service url: {0}")]
    Url(#[from] url::ParseError),
    #[error("delivery service returned {0}")]
    Status(StatusCode),
}

/// Delivery prices for one postcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryQuote {
    pub postcode: String,
    pub economy_price: Decimal,
    pub premium_price: Decimal,
}

#[derive(Debug, Clone)]
pub struct DeliveryClient {
    client: reqwest::Client,
    base_url: Url,
}

impl DeliveryClient {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client, base_url }
    }

    fn quote_url(&self, postcode: &Postcode) -> Result<Url, DeliveryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| DeliveryError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(["api", "delivery", postcode.as_str()]);
        Ok(url)
    }

    /// Prices for a postcode, or `None` if the service does not know it.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError` if the service is unreachable or fails.
    #[instrument(skip(self), fields(postcode = %postcode.as_str()))]
    pub async fn quote(&self, postcode: &Postcode) -> Result<Option<DeliveryQuote>, DeliveryError> {
        let response = self.client.get(self.quote_url(postcode)?).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(DeliveryError::Status(status)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_url_joins_segments() {
        let client = DeliveryClient::new(Url::parse("http://localhost:4000/").unwrap());
        let url = client.quote_url(&Postcode::parse("sw1a").unwrap()).unwrap();
        assert_eq!(url.as_str(), "http://localhost:4000/api/delivery/SW1A");
    }

    #[test]
    fn test_quote_accepts_string_or_number_prices() {
        let quote: DeliveryQuote = serde_json::from_str(
            r#"{"postcode": "SW1A", "economy_price": "45.00", "premium_price": 70}"#,
        )
        .unwrap();
        assert_eq!(quote.economy_price, "45.00".parse::<Decimal>().unwrap());
        assert_eq!(quote.premium_price, Decimal::from(70));
    }
}
