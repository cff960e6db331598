//! Integration tests for Cartwheel.
//!
//! Every test needs a PostgreSQL database and is ignored by default.
//!
//! # Running Tests
//!
//! ```bash
//! export DATABASE_URL=postgres://localhost/cartwheel_test
//! cargo test -p cartwheel-integration-tests -- --ignored
//! ```
//!
//! Each [`TestContext`] applies migrations, starts the storefront on an
//! ephemeral port and talks to it over HTTP. Tests share the database, so
//! they create their own users and items under unique names.

#![allow(
    clippy::missing_panics_doc,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

use cartwheel_core::{ItemId, ItemStatus, Price, UserId};
use cartwheel_storefront::{config::StorefrontConfig, db::ItemRepository, routes, state::AppState};

/// Signing secret used by test servers.
const TEST_TOKEN_SECRET: &str = "T3st!ng-s3cr3t#for_Cartwheel$int3gration%";

/// A running storefront plus direct database access.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub pool: PgPool,
}

/// A signed-up, logged-in user.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: UserId,
    pub username: String,
    pub token: String,
}

impl TestContext {
    /// Connect, migrate and start a server.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();
        let database_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must point at a test database");

        let pool = PgPool::connect(&database_url).await.unwrap();
        sqlx::migrate!("../storefront/migrations")
            .run(&pool)
            .await
            .unwrap();

        let config = StorefrontConfig {
            database_url: SecretString::from(database_url),
            max_db_connections: 10,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            token_secret: SecretString::from(TEST_TOKEN_SECRET),
            token_ttl: Duration::from_secs(3600),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        };
        let app = routes::app(AppState::new(config, pool.clone()));

        let listener = tokio::net::TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            client: Client::new(),
            base_url: format!("http://{addr}"),
            pool,
        }
    }

    /// URL for an API path such as `/carts`.
    #[must_use]
    pub fn api(&self, path: &str) -> String {
        format!("{}/api{path}", self.base_url)
    }

    /// Attach a bearer token.
    #[must_use]
    pub fn authed(builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder.bearer_auth(token)
    }

    /// Sign up and log in a fresh user.
    pub async fn signup_and_login(&self) -> TestUser {
        let username = unique_name("user");
        let password = "correct-horse";

        let response = self
            .client
            .post(self.api("/users"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);

        let response = self
            .client
            .post(self.api("/users/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();

        TestUser {
            id: UserId::new(i32::try_from(body["user_id"].as_i64().unwrap()).unwrap()),
            username,
            token: body["token"].as_str().unwrap().to_owned(),
        }
    }

    /// Create an available item through the API.
    pub async fn create_item(&self, user: &TestUser, name: &str, price: &str) -> ItemId {
        let response = Self::authed(self.client.post(self.api("/items")), &user.token)
            .json(&json!({ "name": name, "price": price }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.unwrap();
        ItemId::new(i32::try_from(body["id"].as_i64().unwrap()).unwrap())
    }

    /// Create an item that cannot be added to carts. There is no API for
    /// this, so it goes through the repository.
    pub async fn create_unavailable_item(&self, name: &str) -> ItemId {
        let price = Price::new(Decimal::new(1000, 2)).unwrap();
        let (item, _) = ItemRepository::new(&self.pool)
            .upsert_by_name(name, price, ItemStatus::Unavailable)
            .await
            .unwrap();
        item.id
    }

    /// `POST /carts` with optional bearer token and session header.
    pub async fn add_to_cart(
        &self,
        token: Option<&str>,
        session: Option<&str>,
        item_id: ItemId,
        quantity: Option<i32>,
    ) -> Response {
        let mut body = json!({ "item_id": item_id });
        if let Some(quantity) = quantity {
            body["quantity"] = json!(quantity);
        }
        let mut request = self.client.post(self.api("/carts")).json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(session) = session {
            request = request.header("x-session-id", session);
        }
        request.send().await.unwrap()
    }

    /// `GET /carts` with optional bearer token and session header.
    pub async fn view_cart(&self, token: Option<&str>, session: Option<&str>) -> (u16, Value) {
        let mut request = self.client.get(self.api("/carts"));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(session) = session {
            request = request.header("x-session-id", session);
        }
        let response = request.send().await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    /// Number of active carts for an owner key, read directly.
    pub async fn active_cart_count(&self, owner_key: &str) -> i64 {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM storefront.cart WHERE owner_key = $1 AND status = 'active'",
        )
        .bind(owner_key)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    /// Number of orders a user has, read directly.
    pub async fn order_count(&self, user_id: UserId) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM storefront.customer_order WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

/// A name no other test run will use.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &suffix[..12])
}
