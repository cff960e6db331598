//! Order endpoints. Both require a bearer token.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use cartwheel_core::{CartId, OrderId, OrderStatus};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::{OrderSummary, PlacedOrder, PricedLine};
use crate::services::OrderService;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PlaceOrderResponse {
    message: &'static str,
    order_id: OrderId,
    cart_id: CartId,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    items: Vec<PricedLine>,
}

impl From<PlacedOrder> for PlaceOrderResponse {
    fn from(placed: PlacedOrder) -> Self {
        Self {
            message: "Order created successfully",
            order_id: placed.order.id,
            cart_id: placed.order.cart_id,
            status: placed.order.status,
            created_at: placed.order.created_at,
            items: placed.items,
        }
    }
}

/// Turn the caller's active cart into an order.
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(user_id): RequireAuth,
) -> Result<(StatusCode, Json<PlaceOrderResponse>)> {
    let placed = OrderService::new(state.pool()).place_order(user_id).await?;

    let order_field = placed.order.id.to_string();
    add_breadcrumb("order", "Placed order", Some(&[("order_id", order_field.as_str())]));

    Ok((StatusCode::CREATED, Json(placed.into())))
}

/// The caller's order history.
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user_id): RequireAuth,
) -> Result<Json<Vec<OrderSummary>>> {
    let orders = OrderService::new(state.pool()).list_orders(user_id).await?;
    Ok(Json(orders))
}
