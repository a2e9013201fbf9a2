//! Integration tests for Flagstone.
//!
//! # Running Tests
//!
//! Start both services against a migrated, seeded database, then:
//!
//! ```bash
//! cargo test -p flagstone-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `catalog` - Category list, filtered category pages, HTML pages
//! - `cart` - Auth, persistent cart, cache-only cart, user details
//! - `delivery` - Delivery pricing API

use serde_json::{Value, json};

/// Shared HTTP client and service URLs.
pub struct TestContext {
    pub client: reqwest::Client,
    pub storefront_url: String,
    pub delivery_url: String,
}

impl TestContext {
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            storefront_url: env_or("STOREFRONT_TEST_URL", "http://localhost:3000"),
            delivery_url: env_or("DELIVERY_TEST_URL", "http://localhost:4000"),
        }
    }

    #[must_use]
    pub fn storefront(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url)
    }

    #[must_use]
    pub fn delivery(&self, path: &str) -> String {
        format!("{}{path}", self.delivery_url)
    }

    /// Register a fresh account and return its token.
    ///
    /// # Panics
    ///
    /// Panics if registration does not succeed.
    pub async fn register(&self) -> String {
        let name = format!("it-{}", uuid::Uuid::new_v4().simple());
        let response = self
            .client
            .post(self.storefront("/api/auth/local/register"))
            .json(&json!({
                "username": name,
                "email": format!("{name}@example.test"),
                "password": "correct horse battery staple",
            }))
            .send()
            .await
            .expect("register request failed");
        assert_eq!(response.status(), 200, "registration failed");

        let body: Value = response.json().await.expect("register body");
        body["jwt"].as_str().expect("jwt in response").to_string()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|v| v.trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
