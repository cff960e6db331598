//! Signup, login and health against a real database.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use serde_json::{Value, json};

use cartwheel_integration_tests::{TestContext, unique_name};

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_readiness() {
    let ctx = TestContext::new().await;
    let response = ctx
        .client
        .get(format!("{}/health/ready", ctx.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_signup_login_me() {
    let ctx = TestContext::new().await;
    let user = ctx.signup_and_login().await;

    let response = TestContext::authed(ctx.client.get(ctx.api("/users/me")), &user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let me: Value = response.json().await.unwrap();
    assert_eq!(me["id"], user.id.as_i32());
    assert_eq!(me["username"], user.username.as_str());
    assert!(me.get("password_hash").is_none());

    let response = ctx.client.get(ctx.api("/users")).send().await.unwrap();
    let users: Value = response.json().await.unwrap();
    assert!(
        users
            .as_array()
            .unwrap()
            .iter()
            .any(|u| u["username"] == user.username.as_str())
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_duplicate_username() {
    let ctx = TestContext::new().await;
    let username = unique_name("dup");
    let body = json!({ "username": username, "password": "secret-pass" });

    let first = ctx.client.post(ctx.api("/users")).json(&body).send().await.unwrap();
    assert_eq!(first.status(), 201);
    let created: Value = first.json().await.unwrap();
    assert_eq!(created["message"], "User created successfully");
    assert_eq!(created["username"], username.as_str());

    let second = ctx.client.post(ctx.api("/users")).json(&body).send().await.unwrap();
    assert_eq!(second.status(), 400);
    let error: Value = second.json().await.unwrap();
    assert_eq!(error["code"], "user_exists");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_login_rejects_wrong_password() {
    let ctx = TestContext::new().await;
    let user = ctx.signup_and_login().await;

    let response = ctx
        .client
        .post(ctx.api("/users/login"))
        .json(&json!({ "username": user.username, "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["code"], "invalid_credentials");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_item_listing_dedupes_names() {
    let ctx = TestContext::new().await;
    let user = ctx.signup_and_login().await;
    let name = unique_name("Twin");

    let first = ctx.create_item(&user, &name, "5.00").await;
    ctx.create_item(&user, &name, "6.00").await;

    let items: Value = ctx
        .client
        .get(ctx.api("/items"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let matching: Vec<&Value> = items
        .as_array()
        .unwrap()
        .iter()
        .filter(|item| item["name"] == name.as_str())
        .collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0]["id"], first.as_i32());
    assert_eq!(matching[0]["price"], "5.00");
}
