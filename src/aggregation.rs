//! Aggregation logic for preparing model training data.
//!
//! Raw weekly sales rows are enriched with calendar, marketing and economic
//! features. All feature rules are pure functions of the row's week, year and
//! country.

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::data_sources::SalesHistorySource;
use crate::model::{HistoricalSalesData, SalesAggregation, SalesRecord};

/// ISO weeks of the February and September fashion weeks.
const FASHION_WEEKS: [u32; 4] = [7, 8, 38, 39];

/// Economic index used when a country has no entry.
const DEFAULT_ECONOMIC_INDEX: f64 = 1.0;

/// Load sales between `start` and `end` and enrich every row.
///
/// # Arguments
///
/// * `source` - Where raw sales rows come from
/// * `start` - Start of the window
/// * `end` - End of the window
#[instrument(skip(source))]
pub async fn prepare_training_data(
    source: &dyn SalesHistorySource,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> anyhow::Result<HistoricalSalesData> {
    let records = source.sales_between(start, end).await?;

    info!(
        start = %start,
        end = %end,
        records = records.len(),
        "Preparing training data"
    );

    Ok(HistoricalSalesData {
        aggregations: records.into_iter().map(enrich).collect(),
    })
}

/// Attach derived features to a raw sales row.
pub fn enrich(record: SalesRecord) -> SalesAggregation {
    SalesAggregation {
        is_holiday_season: is_holiday_season(record.week, &record.country),
        fashion_week_proximity: fashion_week_distance(record.week, record.year),
        marketing_campaign_active: is_campaign_active(record.week, record.year),
        economic_index: economic_index(&record.country, record.year),
        product_id: record.product_id,
        collection: record.collection,
        week: record.week,
        year: record.year,
        country: record.country,
        channel: record.channel,
        quantity_sold: record.quantity_sold,
        revenue: record.revenue,
        average_price: record.average_price,
    }
}

/// Holiday season spans late November through January (weeks 48-52 and 1-4).
///
/// The same calendar is used for every country for now.
pub fn is_holiday_season(week: u32, _country: &str) -> bool {
    week >= 48 || week <= 4
}

/// Distance in weeks to the nearest fashion week.
pub fn fashion_week_distance(week: u32, _year: i32) -> u32 {
    FASHION_WEEKS
        .iter()
        .map(|fw| week.abs_diff(*fw))
        .min()
        .unwrap_or(0)
}

/// Campaigns run during the first ten weeks of a collection.
pub fn is_campaign_active(week: u32, _year: i32) -> bool {
    (1..=10).contains(&week)
}

/// Relative strength of the luxury market per country.
pub fn economic_index(country: &str, _year: i32) -> f64 {
    match country {
        "FR" => 1.0,
        "US" => 1.2,
        "CN" => 1.5,
        "JP" => 0.9,
        "UK" => 0.95,
        _ => DEFAULT_ECONOMIC_INDEX,
    }
}
