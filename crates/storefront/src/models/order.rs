//! Order domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cartwheel_core::{CartId, OrderId, OrderStatus, UserId};

use super::cart::PricedLine;

/// An order row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub cart_id: CartId,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A freshly placed order with the lines captured inside the placing
/// transaction.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<PricedLine>,
}

/// One entry of a user's order history.
///
/// `items` are read from the order's cart at query time, so item names and
/// prices reflect the current catalog rather than the moment of purchase.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub cart_id: CartId,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub items: Vec<PricedLine>,
}
