//! Cart and cart line persistence.
//!
//! Every function here takes a `&mut PgConnection` and is meant to run inside
//! a caller-owned transaction; none of them commit.

use sqlx::PgConnection;

use cartwheel_core::{CartId, Identity, ItemId};

use super::RepositoryError;
use crate::models::cart::{Cart, CartLine, PricedLine};

const CART_COLUMNS: &str = "id, user_id, session_id, owner_key, status, created_at, updated_at";
const LINE_COLUMNS: &str = "cart_id, item_id, quantity, created_at, updated_at";

/// How many times to go around find-or-insert before giving up.
///
/// One retry is enough for the insert/commit race; the extra attempt covers a
/// cart that gets ordered between our failed insert and the re-read.
const RESOLVE_ATTEMPTS: usize = 3;

/// Find the active cart for an identity without locking it.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_active(
    conn: &mut PgConnection,
    identity: &Identity,
) -> Result<Option<Cart>, RepositoryError> {
    let cart = sqlx::query_as::<_, Cart>(&format!(
        "SELECT {CART_COLUMNS} FROM storefront.cart WHERE owner_key = $1 AND status = 'active'"
    ))
    .bind(identity.owner_key())
    .fetch_optional(conn)
    .await?;

    Ok(cart)
}

/// Find the active cart for an identity and lock it for the rest of the
/// transaction.
///
/// Concurrent writers for the same owner queue up behind this lock, so at
/// most one of them can turn the cart into an order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_active_for_update(
    conn: &mut PgConnection,
    identity: &Identity,
) -> Result<Option<Cart>, RepositoryError> {
    let cart = sqlx::query_as::<_, Cart>(&format!(
        r"
        SELECT {CART_COLUMNS} FROM storefront.cart
        WHERE owner_key = $1 AND status = 'active'
        FOR UPDATE
        "
    ))
    .bind(identity.owner_key())
    .fetch_optional(conn)
    .await?;

    Ok(cart)
}

/// Insert a new active cart unless the owner already has one.
///
/// Returns `None` when the one-active-cart-per-owner index rejected the row,
/// which means another transaction got there first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails for another reason.
pub async fn insert_active(
    conn: &mut PgConnection,
    identity: &Identity,
) -> Result<Option<Cart>, RepositoryError> {
    let cart = sqlx::query_as::<_, Cart>(&format!(
        r"
        INSERT INTO storefront.cart (user_id, session_id, owner_key)
        VALUES ($1, $2, $3)
        ON CONFLICT (owner_key) WHERE status = 'active' DO NOTHING
        RETURNING {CART_COLUMNS}
        "
    ))
    .bind(identity.user_id())
    .bind(identity.session_token().map(|t| t.as_str().to_owned()))
    .bind(identity.owner_key())
    .fetch_optional(conn)
    .await?;

    Ok(cart)
}

/// Return the identity's active cart, creating it if needed, locked for
/// update.
///
/// Safe under concurrency: if two transactions race to create the cart, the
/// loser's insert is a no-op and it picks up the winner's row on the re-read
/// (which waits for the winner to commit).
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if no active cart could be pinned down
/// after a few attempts. Returns `RepositoryError::Database` on query failure.
pub async fn resolve_active(
    conn: &mut PgConnection,
    identity: &Identity,
) -> Result<Cart, RepositoryError> {
    for attempt in 1..=RESOLVE_ATTEMPTS {
        if let Some(cart) = find_active_for_update(conn, identity).await? {
            return Ok(cart);
        }

        if let Some(cart) = insert_active(conn, identity).await? {
            tracing::debug!(cart_id = %cart.id, "created active cart");
            return Ok(cart);
        }

        tracing::debug!(attempt, "lost active cart creation race, re-reading");
    }

    Err(RepositoryError::Conflict(
        "could not resolve an active cart".to_owned(),
    ))
}

/// Add `delta` to the quantity of an item in a cart, creating the line if
/// it does not exist. Returns the line after the write.
///
/// Returns `Ok(None)` and leaves the line unchanged if the new quantity would
/// not fit in an `INTEGER`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the write fails, including when the
/// cart is no longer active.
pub async fn upsert_line(
    conn: &mut PgConnection,
    cart_id: CartId,
    item_id: ItemId,
    delta: i32,
) -> Result<Option<CartLine>, RepositoryError> {
    // `delta >= 1`, so the subtraction cannot overflow.
    let line = sqlx::query_as::<_, CartLine>(&format!(
        r"
        INSERT INTO storefront.cart_line (cart_id, item_id, quantity)
        VALUES ($1, $2, $3)
        ON CONFLICT (cart_id, item_id) DO UPDATE
        SET quantity = cart_line.quantity + EXCLUDED.quantity
        WHERE cart_line.quantity <= 2147483647 - EXCLUDED.quantity
        RETURNING {LINE_COLUMNS}
        "
    ))
    .bind(cart_id)
    .bind(item_id)
    .bind(delta)
    .fetch_optional(conn)
    .await?;

    Ok(line)
}

/// All lines of a cart in insertion order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lines(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<Vec<CartLine>, RepositoryError> {
    let lines = sqlx::query_as::<_, CartLine>(&format!(
        "SELECT {LINE_COLUMNS} FROM storefront.cart_line WHERE cart_id = $1 ORDER BY created_at, item_id"
    ))
    .bind(cart_id)
    .fetch_all(conn)
    .await?;

    Ok(lines)
}

/// Lines of a cart joined with each item's current name and price.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn priced_lines(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<Vec<PricedLine>, RepositoryError> {
    let lines = sqlx::query_as::<_, PricedLine>(
        r"
        SELECT i.id, i.name, i.price, l.quantity
        FROM storefront.cart_line l
        JOIN storefront.item i ON i.id = l.item_id
        WHERE l.cart_id = $1
        ORDER BY l.created_at, l.item_id
        ",
    )
    .bind(cart_id)
    .fetch_all(conn)
    .await?;

    Ok(lines)
}

/// Get a cart by ID regardless of status.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_id(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<Option<Cart>, RepositoryError> {
    let cart = sqlx::query_as::<_, Cart>(&format!(
        "SELECT {CART_COLUMNS} FROM storefront.cart WHERE id = $1"
    ))
    .bind(cart_id)
    .fetch_optional(conn)
    .await?;

    Ok(cart)
}

/// Flip an active cart to `ordered`.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the cart was not active (already
/// ordered by a concurrent request). Returns `RepositoryError::Database` on
/// query failure.
pub async fn mark_ordered(conn: &mut PgConnection, cart_id: CartId) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE storefront.cart
        SET status = 'ordered'
        WHERE id = $1 AND status = 'active'
        ",
    )
    .bind(cart_id)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::Conflict(format!(
            "cart {cart_id} is no longer active"
        )));
    }

    Ok(())
}
