//! Catalog item repository.

use sqlx::{PgConnection, PgPool};

use cartwheel_core::{ItemId, ItemStatus, Price};

use super::RepositoryError;
use crate::models::item::Item;

const ITEM_COLUMNS: &str = "id, name, price, status, created_at, updated_at";

/// Repository for catalog reads and writes that stand alone.
pub struct ItemRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ItemRepository<'a> {
    /// Create a new item repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every item ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Item>, RepositoryError> {
        let items = sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM storefront.item ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Insert a new item. New items are always `available`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, name: &str, price: Price) -> Result<Item, RepositoryError> {
        let item = sqlx::query_as::<_, Item>(&format!(
            r"
            INSERT INTO storefront.item (name, price)
            VALUES ($1, $2)
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(name)
        .bind(price)
        .fetch_one(self.pool)
        .await?;

        Ok(item)
    }

    /// Insert an item, or update price and status of the lowest-ID item that
    /// already has this name.
    ///
    /// Returns the item and whether it was newly created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn upsert_by_name(
        &self,
        name: &str,
        price: Price,
        status: ItemStatus,
    ) -> Result<(Item, bool), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Item>(&format!(
            r"
            UPDATE storefront.item
            SET price = $2, status = $3
            WHERE id = (
                SELECT id FROM storefront.item
                WHERE name = $1
                ORDER BY id
                LIMIT 1
                FOR UPDATE
            )
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(name)
        .bind(price)
        .bind(status)
        .fetch_optional(&mut *tx)
        .await?;

        let result = if let Some(item) = updated {
            (item, false)
        } else {
            let item = sqlx::query_as::<_, Item>(&format!(
                r"
                INSERT INTO storefront.item (name, price, status)
                VALUES ($1, $2, $3)
                RETURNING {ITEM_COLUMNS}
                "
            ))
            .bind(name)
            .bind(price)
            .bind(status)
            .fetch_one(&mut *tx)
            .await?;
            (item, true)
        };

        tx.commit().await?;

        Ok(result)
    }
}

/// Read an item and hold a share lock on it until the transaction ends.
///
/// The lock keeps the item from being deleted or flipped to unavailable
/// between the availability check and the cart line write.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_for_share(
    conn: &mut PgConnection,
    id: ItemId,
) -> Result<Option<Item>, RepositoryError> {
    let item = sqlx::query_as::<_, Item>(&format!(
        "SELECT {ITEM_COLUMNS} FROM storefront.item WHERE id = $1 FOR SHARE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(item)
}
