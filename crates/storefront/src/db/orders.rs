//! Order persistence.

use sqlx::PgConnection;

use cartwheel_core::{CartId, OrderStatus, UserId};

use super::RepositoryError;
use crate::models::order::Order;

const ORDER_COLUMNS: &str = "id, user_id, cart_id, status, created_at, updated_at";

/// Insert an order for a cart.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the cart already has an order.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn insert(
    conn: &mut PgConnection,
    user_id: UserId,
    cart_id: CartId,
    status: OrderStatus,
) -> Result<Order, RepositoryError> {
    sqlx::query_as::<_, Order>(&format!(
        r"
        INSERT INTO storefront.customer_order (user_id, cart_id, status)
        VALUES ($1, $2, $3)
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(user_id)
    .bind(cart_id)
    .bind(status)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return RepositoryError::Conflict(format!("cart {cart_id} already has an order"));
        }
        RepositoryError::Database(e)
    })
}

/// All orders of a user, oldest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_for_user(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Vec<Order>, RepositoryError> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM storefront.customer_order WHERE user_id = $1 ORDER BY id"
    ))
    .bind(user_id)
    .fetch_all(conn)
    .await?;

    Ok(orders)
}
