//! Historical sales provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::model::SalesRecord;

/// Source of raw weekly sales rows.
#[async_trait]
pub trait SalesHistorySource: Send + Sync {
    /// Sales rows recorded between `start` and `end`.
    async fn sales_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<SalesRecord>>;
}

/// Fixed in-memory sales history.
///
/// Holds a small demo dataset and returns all of it for any window.
#[derive(Debug, Clone, Default)]
pub struct InMemorySalesHistory {
    records: Vec<SalesRecord>,
}

impl InMemorySalesHistory {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    /// Two weeks of Spring 2024 sales of BAG-001 in France.
    pub fn sample() -> Self {
        let price = Decimal::from(5_000);
        Self::new(vec![
            SalesRecord {
                product_id: "BAG-001".to_string(),
                collection: "Spring 2024".to_string(),
                week: 15,
                year: 2024,
                country: "FR".to_string(),
                channel: "Boutique".to_string(),
                quantity_sold: 45,
                revenue: Decimal::from(225_000),
                average_price: price,
            },
            SalesRecord {
                product_id: "BAG-001".to_string(),
                collection: "Spring 2024".to_string(),
                week: 16,
                year: 2024,
                country: "FR".to_string(),
                channel: "Online".to_string(),
                quantity_sold: 23,
                revenue: Decimal::from(115_000),
                average_price: price,
            },
        ])
    }
}

#[async_trait]
impl SalesHistorySource for InMemorySalesHistory {
    async fn sales_between(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<SalesRecord>> {
        Ok(self.records.clone())
    }
}
