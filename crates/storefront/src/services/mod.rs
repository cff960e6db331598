//! Business logic services for storefront.
//!
//! # Services
//!
//! - `identity` - Decide who owns the cart for a request (user or session)
//! - `auth` - Signup, login and bearer tokens
//! - `catalog` - Item listing and creation
//! - `cart` - Active cart resolution, adding lines, viewing
//! - `orders` - Turning a cart into an order, order history
//!
//! Services borrow the pool from [`crate::state::AppState`] and are cheap to
//! construct per request.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod identity;
pub mod orders;

pub use auth::{AuthError, AuthService, TokenService};
pub use cart::{CartError, CartService};
pub use catalog::{CatalogError, CatalogService};
pub use identity::{IdentityError, MintPolicy, ResolvedIdentity};
pub use orders::OrderService;
