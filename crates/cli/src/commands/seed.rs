//! Catalog seeding.
//!
//! Reads a list of items from YAML and upserts each one by name, so running
//! the seed twice leaves one row per name with the latest price and status.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use cartwheel_core::{ItemStatus, Price};
use cartwheel_storefront::db::ItemRepository;

use super::{CliError, connect};

/// The catalog loaded when no file is given.
const DEFAULT_CATALOG: &str = include_str!("../../seed/items.yaml");

/// A seed file.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub items: Vec<SeedItem>,
}

/// One catalog entry. Prices of zero or less are rejected while parsing.
#[derive(Debug, Deserialize)]
pub struct SeedItem {
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub status: ItemStatus,
}

impl SeedFile {
    /// Parse and validate a seed document.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Yaml` for malformed YAML or bad prices, and
    /// `CliError::InvalidSeed` for blank or repeated names.
    pub fn parse(content: &str) -> Result<Self, CliError> {
        let mut file: Self = serde_yaml::from_str(content)?;

        let mut seen = HashSet::with_capacity(file.items.len());
        for item in &mut file.items {
            item.name = item.name.trim().to_owned();
            if item.name.is_empty() {
                return Err(CliError::InvalidSeed("item name cannot be blank".into()));
            }
            if !seen.insert(item.name.clone()) {
                return Err(CliError::InvalidSeed(format!(
                    "item {:?} appears more than once",
                    item.name
                )));
            }
        }

        Ok(file)
    }
}

/// Load a seed file from disk, or the built-in catalog.
async fn load(path: Option<&Path>) -> Result<SeedFile, CliError> {
    let Some(path) = path else {
        info!("Using built-in catalog");
        return SeedFile::parse(DEFAULT_CATALOG);
    };

    info!(path = %path.display(), "Loading catalog from file");
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Io {
            path: path.display().to_string(),
            source,
        })?;
    SeedFile::parse(&content)
}

/// Upsert every item of the seed into the catalog.
///
/// # Errors
///
/// Returns `CliError` if the file is invalid or a database write fails.
pub async fn items(path: Option<&Path>) -> Result<(), CliError> {
    // Validate before connecting.
    let seed = load(path).await?;
    info!(items = seed.items.len(), "Parsed catalog");

    let pool = connect().await?;
    let repo = ItemRepository::new(&pool);

    let (mut created, mut updated) = (0_usize, 0_usize);
    for entry in &seed.items {
        let (item, was_created) = repo
            .upsert_by_name(&entry.name, entry.price, entry.status)
            .await?;
        if was_created {
            created += 1;
        } else {
            updated += 1;
        }
        info!(item_id = %item.id, name = %item.name, price = %item.price, created = was_created, "Seeded item");
    }

    info!(created, updated, "Seeding complete");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_default_catalog() {
        let seed = SeedFile::parse(DEFAULT_CATALOG).unwrap();
        let names: Vec<&str> = seed.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            ["Laptop", "Smartphone", "Headphones", "Keyboard", "Mouse"]
        );
        assert_eq!(seed.items[0].price.amount(), Decimal::new(99_999, 2));
        assert!(seed.items.iter().all(|i| i.status == ItemStatus::Available));
    }

    #[test]
    fn test_status_override() {
        let seed = SeedFile::parse(
            "items:\n  - name: Tablet\n    price: \"329.00\"\n    status: unavailable\n",
        )
        .unwrap();
        assert_eq!(seed.items[0].status, ItemStatus::Unavailable);
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let result = SeedFile::parse("items:\n  - name: Free\n    price: \"0\"\n");
        assert!(matches!(result, Err(CliError::Yaml(_))));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let result = SeedFile::parse(
            "items:\n  - name: Mouse\n    price: \"1.00\"\n  - name: \" Mouse \"\n    price: \"2.00\"\n",
        );
        assert!(matches!(result, Err(CliError::InvalidSeed(_))));
    }

    #[test]
    fn test_rejects_blank_name() {
        let result = SeedFile::parse("items:\n  - name: \"  \"\n    price: \"1.00\"\n");
        assert!(matches!(result, Err(CliError::InvalidSeed(_))));
    }
}
