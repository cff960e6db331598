//! Cart flows against a real database.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use cartwheel_core::{Identity, ItemId, SessionToken};
use cartwheel_integration_tests::{TestContext, unique_name};
use cartwheel_storefront::services::CartService;

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_anonymous_cart_flow() {
    let ctx = TestContext::new().await;
    let seller = ctx.signup_and_login().await;
    let item = ctx
        .create_item(&seller, &unique_name("Lamp"), "19.99")
        .await;

    // First add with no identity mints a session.
    let response = ctx.add_to_cart(None, None, item, None).await;
    assert_eq!(response.status(), 200);
    let session = response
        .headers()
        .get("x-session-id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    assert!(session.starts_with("sess_"));
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Item added to cart successfully");
    let cart_id = body["cart_id"].clone();
    assert_eq!(body["cart"]["items"][0]["quantity"], 1);

    // Same session, same cart, quantity accumulates; nothing is minted.
    let response = ctx.add_to_cart(None, Some(&session), item, Some(2)).await;
    assert_eq!(response.status(), 200);
    assert!(response.headers().get("x-session-id").is_none());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["cart_id"], cart_id);
    assert_eq!(body["cart"]["items"][0]["quantity"], 3);

    // Omitted quantity on an existing line adds exactly one.
    let response = ctx.add_to_cart(None, Some(&session), item, None).await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["cart_id"], cart_id);
    assert_eq!(body["cart"]["items"][0]["quantity"], 4);

    let (status, view) = ctx.view_cart(None, Some(&session)).await;
    assert_eq!(status, 200);
    assert_eq!(view["cart_id"], cart_id);
    assert_eq!(view["items"].as_array().unwrap().len(), 1);
    assert_eq!(view["total"], "79.96");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_quantity_overflow_is_rejected() {
    let ctx = TestContext::new().await;
    let seller = ctx.signup_and_login().await;
    let item = ctx
        .create_item(&seller, &unique_name("Bolt"), "0.01")
        .await;
    let session = unique_name("sess");

    let response = ctx
        .add_to_cart(None, Some(&session), item, Some(i32::MAX))
        .await;
    assert_eq!(response.status(), 200);

    let response = ctx
        .add_to_cart(None, Some(&session), item, Some(i32::MAX))
        .await;
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "invalid_quantity");

    // The line keeps its previous quantity.
    let (status, view) = ctx.view_cart(None, Some(&session)).await;
    assert_eq!(status, 200);
    assert_eq!(view["items"][0]["quantity"], i32::MAX);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_view_without_cart_does_not_create_one() {
    let ctx = TestContext::new().await;
    let session = unique_name("sess");

    let (status, view) = ctx.view_cart(None, Some(&session)).await;
    assert_eq!(status, 200);
    assert_eq!(view["message"], "No active cart found");
    assert!(view["cart"].is_null());

    let owner_key = format!("session:{session}");
    assert_eq!(ctx.active_cart_count(&owner_key).await, 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_unavailable_item_rolls_back_new_cart() {
    let ctx = TestContext::new().await;
    let item = ctx.create_unavailable_item(&unique_name("Retired")).await;
    let session = unique_name("sess");

    let response = ctx.add_to_cart(None, Some(&session), item, None).await;
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "item_unavailable");

    let (_, view) = ctx.view_cart(None, Some(&session)).await;
    assert_eq!(view["message"], "No active cart found");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_missing_item_is_not_found() {
    let ctx = TestContext::new().await;
    let session = unique_name("sess");

    let response = ctx
        .add_to_cart(None, Some(&session), ItemId::new(i32::MAX), None)
        .await;
    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "item_not_found");

    let owner_key = format!("session:{session}");
    assert_eq!(ctx.active_cart_count(&owner_key).await, 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_authenticated_identity_wins_over_session() {
    let ctx = TestContext::new().await;
    let user = ctx.signup_and_login().await;
    let item = ctx.create_item(&user, &unique_name("Mug"), "8.50").await;
    let session = unique_name("sess");

    let response = ctx
        .add_to_cart(Some(&user.token), Some(&session), item, None)
        .await;
    assert_eq!(response.status(), 200);

    assert_eq!(ctx.active_cart_count(&format!("user:{}", user.id)).await, 1);
    assert_eq!(ctx.active_cart_count(&format!("session:{session}")).await, 0);

    let (_, view) = ctx.view_cart(Some(&user.token), None).await;
    assert_eq!(view["total"], "8.50");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_resolve_creates_one_cart() {
    let ctx = TestContext::new().await;
    let token = SessionToken::parse(&unique_name("sess")).unwrap();
    let identity = Identity::Anonymous(token);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let pool = ctx.pool.clone();
        let identity = identity.clone();
        handles.push(tokio::spawn(async move {
            CartService::new(&pool)
                .resolve_active_cart(&identity)
                .await
                .unwrap()
                .id
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 1, "every caller must see the same cart");
    assert_eq!(ctx.active_cart_count(&identity.owner_key()).await, 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_adds_accumulate() {
    let ctx = Arc::new(TestContext::new().await);
    let user = ctx.signup_and_login().await;
    let item = ctx.create_item(&user, &unique_name("Pen"), "1.25").await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ctx = Arc::clone(&ctx);
            let token = user.token.clone();
            tokio::spawn(async move {
                ctx.add_to_cart(Some(&token), None, item, Some(1))
                    .await
                    .status()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 200);
    }

    assert_eq!(ctx.active_cart_count(&format!("user:{}", user.id)).await, 1);
    let (_, view) = ctx.view_cart(Some(&user.token), None).await;
    assert_eq!(view["items"][0]["quantity"], 8);
    assert_eq!(view["total"], "10.00");
}
