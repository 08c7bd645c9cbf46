//! Product catalog provider.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::model::Product;

/// Source of product metadata for a collection.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// All products belonging to `collection_id`.
    async fn products_for_collection(&self, collection_id: &str) -> anyhow::Result<Vec<Product>>;
}

/// A product line that is offered in every collection.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub average_price: Decimal,
}

impl CatalogEntry {
    pub fn new(id: &str, name: &str, average_price: Decimal) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            average_price,
        }
    }
}

/// Fixed in-memory catalog.
///
/// Every requested collection receives the same product lines, stamped with
/// the requested collection id.
#[derive(Debug, Clone)]
pub struct InMemoryCatalog {
    entries: Vec<CatalogEntry>,
}

impl InMemoryCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// The demo catalog: three leather goods lines.
    pub fn sample() -> Self {
        Self::new(vec![
            CatalogEntry::new("BAG-001", "Iconic Bag", Decimal::from(5_000)),
            CatalogEntry::new("BAG-002", "Travel Trunk", Decimal::from(12_000)),
            CatalogEntry::new("BAG-003", "Small Bag", Decimal::from(3_500)),
        ])
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::sample()
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn products_for_collection(&self, collection_id: &str) -> anyhow::Result<Vec<Product>> {
        Ok(self
            .entries
            .iter()
            .map(|entry| Product {
                id: entry.id.clone(),
                name: entry.name.clone(),
                collection: collection_id.to_string(),
                average_price: entry.average_price,
            })
            .collect())
    }
}
