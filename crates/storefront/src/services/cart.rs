//! Cart operations.
//!
//! Every mutating operation runs in one transaction that is rolled back on
//! any error: `sqlx::Transaction` rolls back when dropped, so an early `?`
//! return (or a cancelled request future) leaves nothing behind. In
//! particular, an add-to-cart that fails on the item check also discards
//! the cart it lazily created.

use sqlx::{PgConnection, PgPool};
use thiserror::Error;

use cartwheel_core::{Identity, ItemId};

use crate::db::{self, RepositoryError, carts, items};
use crate::models::cart::{Cart, CartLine, CartView, CartWithLines};

/// Business rule failures for carts and orders.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    #[error("item {0} is not available")]
    ItemUnavailable(ItemId),

    #[error("quantity must be at least 1 (got {0})")]
    InvalidQuantity(i32),

    #[error("quantity for item {0} would exceed 2147483647")]
    QuantityOverflow(ItemId),

    #[error("no active cart found")]
    NoActiveCart,

    #[error("cannot create order with empty cart")]
    EmptyCart,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CartError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// The result of adding an item to a cart.
#[derive(Debug, Clone)]
pub struct AddedLine {
    /// The line after the write.
    pub line: CartLine,
    /// The whole cart after the write.
    pub cart: CartWithLines,
}

/// Cart service.
pub struct CartService<'a> {
    pool: &'a PgPool,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find or create the active cart for an identity, in its own transaction.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    #[tracing::instrument(skip_all)]
    pub async fn resolve_active_cart(&self, identity: &Identity) -> Result<Cart, CartError> {
        let mut tx = self.pool.begin().await?;
        let cart = carts::resolve_active(&mut tx, identity).await?;
        tx.commit().await?;
        Ok(cart)
    }

    /// Add `delta` units of an item to `cart` on an open connection.
    ///
    /// Holds a share lock on the item until the surrounding transaction ends.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for `delta < 1`,
    /// `CartError::ItemNotFound` / `CartError::ItemUnavailable` for a bad
    /// item, `CartError::QuantityOverflow` if the total would not fit in an
    /// `i32`, `CartError::NoActiveCart` if the cart was already ordered.
    pub async fn add_line(
        conn: &mut PgConnection,
        cart: &Cart,
        item_id: ItemId,
        delta: i32,
    ) -> Result<CartLine, CartError> {
        if delta < 1 {
            return Err(CartError::InvalidQuantity(delta));
        }
        if !cart.status.accepts_lines() {
            return Err(CartError::NoActiveCart);
        }

        let item = items::get_for_share(conn, item_id)
            .await?
            .ok_or(CartError::ItemNotFound(item_id))?;
        if !item.is_available() {
            return Err(CartError::ItemUnavailable(item_id));
        }

        let line = carts::upsert_line(conn, cart.id, item_id, delta)
            .await?
            .ok_or(CartError::QuantityOverflow(item_id))?;
        tracing::info!(
            cart_id = %cart.id,
            item_id = %item_id,
            delta,
            quantity = line.quantity,
            "cart line updated"
        );
        Ok(line)
    }

    /// Resolve the identity's active cart and add an item to it, atomically.
    ///
    /// # Errors
    ///
    /// See [`Self::add_line`]. Nothing is written when an error is returned.
    #[tracing::instrument(skip_all, fields(item_id = %item_id, quantity))]
    pub async fn add_to_cart(
        &self,
        identity: &Identity,
        item_id: ItemId,
        quantity: i32,
    ) -> Result<AddedLine, CartError> {
        // Checked before touching the pool so a bad request costs nothing.
        if quantity < 1 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let mut tx = self.pool.begin().await?;

        let cart = carts::resolve_active(&mut tx, identity).await?;
        let line = Self::add_line(&mut tx, &cart, item_id, quantity).await?;
        let lines = carts::lines(&mut tx, cart.id).await?;

        tx.commit().await?;

        Ok(AddedLine {
            line,
            cart: CartWithLines { cart, items: lines },
        })
    }

    /// Read the identity's active cart with current prices. Never creates a
    /// cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    #[tracing::instrument(skip_all)]
    pub async fn view(&self, identity: &Identity) -> Result<CartView, CartError> {
        let mut tx = db::begin_read(self.pool).await?;

        let Some(cart) = carts::find_active(&mut tx, identity).await? else {
            return Ok(CartView::NoActiveCart);
        };
        let lines = carts::priced_lines(&mut tx, cart.id).await?;

        tx.commit().await?;

        Ok(CartView::from_priced_lines(cart.id, lines))
    }
}
