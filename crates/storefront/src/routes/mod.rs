//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (database ping)
//!
//! # Users
//! POST /api/users              - Sign up
//! POST /api/users/login        - Log in, returns a bearer token
//! GET  /api/users/me           - Current user (bearer)
//! GET  /api/users              - All users
//!
//! # Items
//! GET  /api/items              - Catalog, one entry per name
//! POST /api/items              - Create item (bearer)
//!
//! # Carts (bearer or X-Session-ID)
//! POST /api/carts              - Add item to the active cart
//! GET  /api/carts              - View the active cart
//!
//! # Orders (bearer)
//! POST /api/orders             - Place an order from the active cart
//! GET  /api/orders             - Order history
//! ```

pub mod carts;
pub mod health;
pub mod items;
pub mod orders;
pub mod users;

use std::time::Duration;

use axum::{
    Router,
    http::{
        HeaderName, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::middleware::{SESSION_HEADER, request_id_middleware};
use crate::state::AppState;

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(users::signup).get(users::list))
        .route("/login", post(users::login))
        .route("/me", get(users::me))
}

/// Create the item routes router.
pub fn item_routes() -> Router<AppState> {
    Router::new().route("/", get(items::list).post(items::create))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new().route("/", get(carts::show).post(carts::add))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new().route("/", get(orders::list).post(orders::place))
}

/// Create all API routes, to be nested under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/users", user_routes())
        .nest("/items", item_routes())
        .nest("/carts", cart_routes())
        .nest("/orders", order_routes())
}

fn cors_layer() -> CorsLayer {
    let session_header = HeaderName::from_static(SESSION_HEADER);
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, session_header.clone()])
        .expose_headers([session_header])
}

/// Build the complete application: health checks, the API, request IDs,
/// request tracing and CORS.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", routes())
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(cors_layer())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use cartwheel_core::UserId;

    use super::*;
    use crate::config::StorefrontConfig;

    /// An app whose pool never connects; only paths that fail before
    /// touching the database can be exercised.
    fn test_state() -> AppState {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/cartwheel_test")
            .unwrap();
        AppState::new(StorefrontConfig::for_tests(), pool)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    fn json_post(uri: &str) -> axum::http::request::Builder {
        Request::post(uri).header(CONTENT_TYPE, "application/json")
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(test_state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn test_upstream_request_id_echoed() {
        let response = app(test_state())
            .oneshot(
                Request::get("/health")
                    .header("x-request-id", "edge-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "edge-42");
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let (status, body) = send(
            app(test_state()),
            Request::get("/api/users/me").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "missing_token");
    }

    #[tokio::test]
    async fn test_orders_reject_garbage_token() {
        let (status, body) = send(
            app(test_state()),
            Request::post("/api/orders")
                .header(AUTHORIZATION, "Bearer not-a-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["code"].as_str().unwrap().ends_with("token"));
    }

    #[tokio::test]
    async fn test_wrong_auth_scheme() {
        let (status, body) = send(
            app(test_state()),
            Request::get("/api/orders")
                .header(AUTHORIZATION, "Basic dXNlcjpwYXNz")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "invalid_auth_header");
    }

    #[tokio::test]
    async fn test_create_item_rejects_zero_price() {
        let state = test_state();
        let token = state.tokens().issue(UserId::new(1)).unwrap();
        let body = r#"{"name": "Freebie", "price": 0}"#;
        let (status, json) = send(
            app(state),
            json_post("/api/items")
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "bad_request");
    }

    #[tokio::test]
    async fn test_create_item_requires_auth() {
        let body = r#"{"name": "Lamp", "price": "19.99"}"#;
        let (status, _) = send(
            app(test_state()),
            json_post("/api/items")
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_signup_rejects_short_password() {
        let body = r#"{"username": "alice", "password": "12345"}"#;
        let (status, json) = send(
            app(test_state()),
            json_post("/api/users")
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "weak_password");
    }

    #[tokio::test]
    async fn test_signup_rejects_malformed_json() {
        let body = r#"{"username": "alice""#;
        let (status, json) = send(
            app(test_state()),
            json_post("/api/users")
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "bad_request");
    }

    #[tokio::test]
    async fn test_add_to_cart_rejects_zero_quantity() {
        let body = r#"{"item_id": 1, "quantity": 0}"#;
        let (status, json) = send(
            app(test_state()),
            json_post("/api/carts")
                .header(SESSION_HEADER, "sess_abc")
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "invalid_quantity");
    }

    #[tokio::test]
    async fn test_add_to_cart_rejects_bad_session_header() {
        let body = r#"{"item_id": 1}"#;
        let (status, json) = send(
            app(test_state()),
            json_post("/api/carts")
                .header(SESSION_HEADER, "x".repeat(300))
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "invalid_session");
    }

    #[tokio::test]
    async fn test_bearer_outranks_malformed_session_header() {
        let state = test_state();
        let token = state.tokens().issue(UserId::new(900_001)).unwrap();
        // Quantity 0 fails after identity resolution and before any query,
        // so reaching that check shows the session header was not parsed.
        let body = r#"{"item_id": 1, "quantity": 0}"#;
        let (status, json) = send(
            app(state),
            json_post("/api/carts")
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .header(SESSION_HEADER, "x".repeat(300))
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "invalid_quantity");
    }

    #[tokio::test]
    async fn test_view_cart_without_identity_has_no_cart() {
        let (status, json) = send(
            app(test_state()),
            Request::get("/api/carts").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            serde_json::json!({ "message": "No active cart found", "cart": null })
        );
    }

    #[tokio::test]
    async fn test_view_cart_rejects_bad_session_header() {
        let (status, json) = send(
            app(test_state()),
            Request::get("/api/carts")
                .header(SESSION_HEADER, "x".repeat(300))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "invalid_session");
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_session_header() {
        let response = app(test_state())
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/carts")
                    .header("origin", "https://shop.example")
                    .header("access-control-request-method", "POST")
                    .header("access-control-request-headers", "x-session-id")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        let allowed = response.headers()["access-control-allow-headers"]
            .to_str()
            .unwrap()
            .to_ascii_lowercase();
        assert!(allowed.contains("x-session-id"));
    }
}
