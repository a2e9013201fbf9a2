//! Delivery pricing API tests.
//!
//! Require a running delivery service.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use flagstone_integration_tests::TestContext;
use serde_json::{Value, json};

/// A postcode unlikely to clash with imported data.
fn test_postcode() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("ZZ{}", &suffix[..6]).to_uppercase()
}

#[tokio::test]
#[ignore = "requires running delivery service"]
async fn test_upsert_get_update_search() {
    let ctx = TestContext::new();
    let postcode = test_postcode();

    let body: Value = ctx
        .client
        .post(ctx.delivery("/api/delivery"))
        .json(&json!({ "postcode": postcode.to_lowercase(), "economy": 40, "premium": "60.50" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["message"], "Inserted/Updated successfully");

    let body: Value = ctx
        .client
        .post(ctx.delivery("/api/delivery"))
        .json(&json!({ "postcode": postcode, "economy": 41, "premium": 61 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["message"], "Inserted/Updated successfully");

    let price: Value = ctx
        .client
        .get(ctx.delivery(&format!("/api/delivery/{}", postcode.to_lowercase())))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(price["postcode"], postcode.as_str());
    assert_eq!(price["economy_price"], "41.00");

    let response = ctx
        .client
        .put(ctx.delivery(&format!("/api/delivery/{postcode}")))
        .json(&json!({ "economy": 42, "premium": 62 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let matches: Value = ctx
        .client
        .get(ctx.delivery(&format!("/api/delivery/search/{}", &postcode[..4])))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(
        matches
            .as_array()
            .unwrap()
            .iter()
            .any(|row| row["postcode"] == postcode.as_str())
    );
}

#[tokio::test]
#[ignore = "requires running delivery service"]
async fn test_unknown_postcode() {
    let ctx = TestContext::new();
    let postcode = test_postcode();

    let response = ctx
        .client
        .get(ctx.delivery(&format!("/api/delivery/{postcode}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Postcode not found");

    let response = ctx
        .client
        .put(ctx.delivery(&format!("/api/delivery/{postcode}")))
        .json(&json!({ "economy": 1, "premium": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = ctx
        .client
        .get(ctx.delivery(&format!("/api/delivery/search/{postcode}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "No records found");
}

#[tokio::test]
#[ignore = "requires running delivery service"]
async fn test_missing_fields() {
    let ctx = TestContext::new();
    let response = ctx
        .client
        .post(ctx.delivery("/api/delivery"))
        .json(&json!({ "postcode": "AB1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Missing fields");
}
