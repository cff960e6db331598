//! Status enums for catalog items, carts and orders.
//!
//! Each enum maps to a `PostgreSQL` enum type in the `storefront` schema and
//! serializes in lowercase, matching the values clients see over the API.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether an item can currently be added to a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.item_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Available,
    Unavailable,
}

/// Lifecycle of a cart.
///
/// A cart starts `Active` and moves to `Ordered` exactly once, when an order
/// is placed from it. Ordered carts accept no further line changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.cart_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum CartStatus {
    #[default]
    Active,
    Ordered,
}

impl CartStatus {
    /// Whether lines may still be added to a cart in this status.
    #[must_use]
    pub const fn accepts_lines(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Order status.
///
/// Orders are written as `Completed` at placement time; `Pending` is the
/// column default and is kept for rows created by other tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.order_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
}

macro_rules! impl_status_str {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// The lowercase wire and database name.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", stringify!($name), ": {}"), s)),
                }
            }
        }
    };
}

impl_status_str!(ItemStatus {
    Available => "available",
    Unavailable => "unavailable",
});

impl_status_str!(CartStatus {
    Active => "active",
    Ordered => "ordered",
});

impl_status_str!(OrderStatus {
    Pending => "pending",
    Completed => "completed",
});
