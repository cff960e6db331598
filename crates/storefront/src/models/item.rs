//! Catalog item.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cartwheel_core::{ItemId, ItemStatus, Price};

/// A catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub price: Price,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Whether the item can be added to a cart right now.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == ItemStatus::Available
    }
}
