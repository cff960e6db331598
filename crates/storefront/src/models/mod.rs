//! Domain models for storefront.
//!
//! Row types decode straight from `sqlx` queries and double as the JSON
//! shapes returned by the API where the two coincide.

pub mod cart;
pub mod item;
pub mod order;
pub mod user;

pub use cart::{Cart, CartLine, CartView, CartWithLines, PricedLine};
pub use item::Item;
pub use order::{Order, OrderSummary, PlacedOrder};
pub use user::{User, UserCredentials};
