//! Order placement and history.

use sqlx::PgPool;

use cartwheel_core::{Identity, OrderStatus, UserId};

use super::cart::CartError;
use crate::db::{self, RepositoryError, carts, orders};
use crate::models::order::{OrderSummary, PlacedOrder};

/// Order service.
pub struct OrderService<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn the user's active cart into a completed order.
    ///
    /// The cart row is locked for the whole transaction, so two concurrent
    /// calls for the same user serialize: the second one finds no active
    /// cart once the first commits.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoActiveCart` if the user has no active cart,
    /// `CartError::EmptyCart` if it has no lines. Nothing is written when an
    /// error is returned.
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    pub async fn place_order(&self, user_id: UserId) -> Result<PlacedOrder, CartError> {
        let identity = Identity::Authenticated(user_id);
        let mut tx = self.pool.begin().await?;

        let cart = carts::find_active_for_update(&mut tx, &identity)
            .await?
            .ok_or(CartError::NoActiveCart)?;

        let items = carts::priced_lines(&mut tx, cart.id).await?;
        if items.is_empty() {
            return Err(CartError::EmptyCart);
        }

        let order = orders::insert(&mut tx, user_id, cart.id, OrderStatus::Completed)
            .await
            .map_err(already_ordered)?;
        carts::mark_ordered(&mut tx, cart.id)
            .await
            .map_err(already_ordered)?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            cart_id = %cart.id,
            lines = items.len(),
            "order placed"
        );
        Ok(PlacedOrder { order, items })
    }

    /// List the user's orders with their lines, oldest first.
    ///
    /// Lines are joined with the current catalog, not a purchase-time copy.
    /// Orders whose cart has disappeared are left out.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    pub async fn list_orders(&self, user_id: UserId) -> Result<Vec<OrderSummary>, CartError> {
        let mut tx = db::begin_read(self.pool).await?;

        let orders = orders::list_for_user(&mut tx, user_id).await?;
        let mut summaries = Vec::with_capacity(orders.len());
        for order in orders {
            let Some(cart) = carts::get_by_id(&mut tx, order.cart_id).await? else {
                tracing::warn!(
                    order_id = %order.id,
                    cart_id = %order.cart_id,
                    "order references a missing cart, skipping"
                );
                continue;
            };
            let items = carts::priced_lines(&mut tx, cart.id).await?;
            summaries.push(OrderSummary {
                order_id: order.id,
                cart_id: order.cart_id,
                status: order.status,
                created_at: order.created_at,
                items,
            });
        }

        tx.commit().await?;

        Ok(summaries)
    }
}

/// A conflict while placing an order means the cart was ordered underneath us.
fn already_ordered(err: RepositoryError) -> CartError {
    match err {
        RepositoryError::Conflict(_) => CartError::NoActiveCart,
        other => CartError::Repository(other),
    }
}
