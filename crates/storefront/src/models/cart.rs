//! Cart domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use cartwheel_core::{CartId, CartStatus, ItemId, Price, UserId};

/// A cart row.
///
/// Exactly one of `user_id` and `session_id` is set. The session token and
/// the derived owner key are never serialized; the token is a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Cart {
    pub id: CartId,
    pub user_id: Option<UserId>,
    #[serde(skip)]
    pub session_id: Option<String>,
    #[serde(skip)]
    pub owner_key: String,
    pub status: CartStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One item in a cart with its accumulated quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CartLine {
    #[serde(skip)]
    pub cart_id: CartId,
    pub item_id: ItemId,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart together with its raw lines, as returned after an add.
#[derive(Debug, Clone, Serialize)]
pub struct CartWithLines {
    #[serde(flatten)]
    pub cart: Cart,
    pub items: Vec<CartLine>,
}

/// A cart line joined with the current item name and price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct PricedLine {
    /// The item ID.
    pub id: ItemId,
    pub name: String,
    pub price: Price,
    pub quantity: i32,
}

impl PricedLine {
    /// `quantity × price` for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.line_total(self.quantity)
    }
}

/// What a shopper sees when looking at their cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartView {
    /// The identity has no active cart. Looking never creates one.
    NoActiveCart,
    /// An active cart exists but has no lines.
    Empty { cart_id: CartId },
    /// An active cart with at least one line.
    Populated {
        cart_id: CartId,
        lines: Vec<PricedLine>,
        total: Decimal,
    },
}

impl CartView {
    /// Build the view for an active cart from its priced lines.
    #[must_use]
    pub fn from_priced_lines(cart_id: CartId, lines: Vec<PricedLine>) -> Self {
        if lines.is_empty() {
            return Self::Empty { cart_id };
        }
        let total = lines.iter().map(PricedLine::line_total).sum();
        Self::Populated {
            cart_id,
            lines,
            total,
        }
    }

    /// The active cart's ID, if there is one.
    #[must_use]
    pub const fn cart_id(&self) -> Option<CartId> {
        match self {
            Self::NoActiveCart => None,
            Self::Empty { cart_id } | Self::Populated { cart_id, .. } => Some(*cart_id),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: i32, price_cents: i64, quantity: i32) -> PricedLine {
        PricedLine {
            id: ItemId::new(id),
            name: format!("item-{id}"),
            price: Price::new(Decimal::new(price_cents, 2)).unwrap(),
            quantity,
        }
    }

    #[test]
    fn test_no_lines_is_empty_cart() {
        let view = CartView::from_priced_lines(CartId::new(3), Vec::new());
        assert_eq!(
            view,
            CartView::Empty {
                cart_id: CartId::new(3)
            }
        );
        assert_eq!(view.cart_id(), Some(CartId::new(3)));
    }

    #[test]
    fn test_total_is_sum_of_quantity_times_price() {
        // 2 × 699.99 + 1 × 49.99 = 1449.97
        let view = CartView::from_priced_lines(
            CartId::new(1),
            vec![line(2, 69_999, 2), line(5, 4_999, 1)],
        );
        let CartView::Populated { lines, total, .. } = view else {
            panic!("expected populated cart");
        };
        assert_eq!(lines.len(), 2);
        assert_eq!(total, Decimal::new(144_997, 2));
    }

    #[test]
    fn test_total_has_no_float_drift() {
        // 3 × 0.10 must be exactly 0.30
        let view = CartView::from_priced_lines(CartId::new(1), vec![line(1, 10, 3)]);
        let CartView::Populated { total, .. } = view else {
            panic!("expected populated cart");
        };
        assert_eq!(total, Decimal::new(30, 2));
    }

    #[test]
    fn test_no_active_cart_has_no_id() {
        assert_eq!(CartView::NoActiveCart.cart_id(), None);
    }

    #[test]
    fn test_cart_json_hides_session() {
        let cart = Cart {
            id: CartId::new(9),
            user_id: None,
            session_id: Some("sess_secret".to_owned()),
            owner_key: "session:sess_secret".to_owned(),
            status: CartStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(CartWithLines {
            cart,
            items: Vec::new(),
        })
        .unwrap();
        assert_eq!(json["id"], 9);
        assert_eq!(json["status"], "active");
        assert!(json["user_id"].is_null());
        assert!(json["items"].as_array().unwrap().is_empty());
        assert!(!json.to_string().contains("sess_secret"));
    }
}
