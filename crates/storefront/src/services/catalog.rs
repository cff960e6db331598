//! Catalog listing and item creation.

use std::collections::HashSet;

use sqlx::PgPool;
use thiserror::Error;

use cartwheel_core::Price;

use crate::db::{ItemRepository, RepositoryError};
use crate::models::item::Item;

/// Longest accepted item name, in characters.
const MAX_NAME_LENGTH: usize = 200;

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("item name cannot be blank")]
    BlankName,

    #[error("item name must be at most 200 characters")]
    NameTooLong,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Catalog service.
pub struct CatalogService<'a> {
    items: ItemRepository<'a>,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            items: ItemRepository::new(pool),
        }
    }

    /// List the catalog with one entry per name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn list(&self) -> Result<Vec<Item>, CatalogError> {
        let items = self.items.list_all().await?;
        let total = items.len();
        let unique = dedupe_by_name(items);
        if unique.len() < total {
            tracing::debug!(
                total,
                unique = unique.len(),
                "dropped duplicate item names from listing"
            );
        }
        Ok(unique)
    }

    /// Create an item. The name is trimmed before it is stored.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::BlankName` or `CatalogError::NameTooLong` for a
    /// bad name, `CatalogError::Repository` if the insert fails.
    pub async fn create(&self, name: &str, price: Price) -> Result<Item, CatalogError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::BlankName);
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(CatalogError::NameTooLong);
        }

        let item = self.items.create(name, price).await?;
        tracing::info!(item_id = %item.id, price = %item.price, "item created");
        Ok(item)
    }
}

/// Keep the first item for each exact name, preserving input order.
///
/// Callers pass items ordered by ID, so the lowest ID wins.
#[must_use]
pub fn dedupe_by_name(items: Vec<Item>) -> Vec<Item> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.name.clone()))
        .collect()
}
