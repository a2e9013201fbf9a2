//! Auth, cart and user-details tests.
//!
//! Require a running storefront with a seeded catalog.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use flagstone_integration_tests::TestContext;
use serde_json::{Value, json};

/// A product id and variation uuid from the first category.
async fn some_variation(ctx: &TestContext) -> (i64, String) {
    let categories: Value = ctx
        .client
        .get(ctx.storefront("/api/categories"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let slug = categories[0]["slug"].as_str().unwrap();

    let detail: Value = ctx
        .client
        .get(ctx.storefront(&format!("/api/category/{slug}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let card = detail["products"]
        .as_array()
        .unwrap()
        .iter()
        .find(|card| card["variation"]["uuid"].is_string())
        .expect("a product with a variation");

    (
        card["product"]["id"].as_i64().unwrap(),
        card["variation"]["uuid"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
#[ignore = "requires running storefront"]
async fn test_cart_requires_auth() {
    let ctx = TestContext::new();
    let response = ctx.client.get(ctx.storefront("/api/cart")).send().await.unwrap();
    assert_eq!(response.status(), 401);

    let response = ctx.client.get(ctx.storefront("/cart")).send().await.unwrap();
    assert!(response.status().is_redirection());
}

#[tokio::test]
#[ignore = "requires running storefront"]
async fn test_login_with_wrong_password() {
    let ctx = TestContext::new();
    let response = ctx
        .client
        .post(ctx.storefront("/api/auth/local"))
        .json(&json!({ "identifier": "nobody@example.test", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore = "requires running storefront"]
async fn test_persistent_cart_lifecycle() {
    let ctx = TestContext::new();
    let token = ctx.register().await;
    let (product, variation) = some_variation(&ctx).await;

    let add = json!({ "product": product, "variation_id": variation, "quantity": 2 });
    let first: Value = ctx
        .client
        .post(ctx.storefront("/api/cart/add"))
        .bearer_auth(&token)
        .json(&add)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["quantity"], 2);

    // Adding the same variation again increments the line
    let second: Value = ctx
        .client
        .post(ctx.storefront("/api/cart/add"))
        .bearer_auth(&token)
        .json(&add)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["quantity"], 4);

    let id = first["id"].as_i64().unwrap();
    let updated: Value = ctx
        .client
        .put(ctx.storefront(&format!("/api/cart/{id}")))
        .bearer_auth(&token)
        .json(&json!({ "quantity": 1 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["quantity"], 1);

    let lines: Value = ctx
        .client
        .get(ctx.storefront("/api/cart"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(lines.as_array().unwrap().len(), 1);
    assert_eq!(lines[0]["product"]["id"], product);

    let response = ctx
        .client
        .delete(ctx.storefront(&format!("/api/cart/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[ignore = "requires running storefront"]
async fn test_other_users_line_is_rejected() {
    let ctx = TestContext::new();
    let owner = ctx.register().await;
    let other = ctx.register().await;
    let (product, variation) = some_variation(&ctx).await;

    let line: Value = ctx
        .client
        .post(ctx.storefront("/api/cart/add"))
        .bearer_auth(&owner)
        .json(&json!({ "product": product, "variation_id": variation }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = line["id"].as_i64().unwrap();

    let response = ctx
        .client
        .delete(ctx.storefront(&format!("/api/cart/{id}")))
        .bearer_auth(&other)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore = "requires running storefront"]
async fn test_cached_cart() {
    let ctx = TestContext::new();
    let token = ctx.register().await;

    let body: Value = ctx
        .client
        .post(ctx.storefront("/api/cart/redis/add"))
        .bearer_auth(&token)
        .json(&json!({ "product": 1, "variation_id": 5, "quantity": 3 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["cart"][0]["quantity"], 3);

    let response = ctx
        .client
        .delete(ctx.storefront("/api/cart/redis/clear"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // A cleared cache is reseeded from the (empty) persistent cart
    let cart: Value = ctx
        .client
        .get(ctx.storefront("/api/cart/redis"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart, json!([]));
}

#[tokio::test]
#[ignore = "requires running storefront"]
async fn test_user_details_round_trip() {
    let ctx = TestContext::new();
    let token = ctx.register().await;

    let response = ctx
        .client
        .put(ctx.storefront("/api/user-details"))
        .bearer_auth(&token)
        .json(&json!({
            "fullName": "  Ada Stone ",
            "phoneNumbers": [{ "phone": "01234 567890" }, { "phone": " " }],
            "savedAddresses": [{ "address": "1 Quarry Lane" }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let me: Value = ctx
        .client
        .get(ctx.storefront("/api/user-details/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let details = &me["userDetails"];
    assert_eq!(details["fullName"], "Ada Stone");
    assert_eq!(details["phoneNumbers"].as_array().unwrap().len(), 1);

    let cached: Value = ctx
        .client
        .get(ctx.storefront("/api/user-details/redis"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cached["fullName"], "Ada Stone");
}

#[tokio::test]
#[ignore = "requires running storefront"]
async fn test_unknown_profile_image_is_bad_request() {
    let ctx = TestContext::new();
    let token = ctx.register().await;

    let response = ctx
        .client
        .put(ctx.storefront("/api/user-details"))
        .bearer_auth(&token)
        .json(&json!({ "profileImage": 2_147_483_000 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}
