//! Data models for luxforecast.
//!
//! Every type that crosses the HTTP boundary (either ours or the forecasting
//! service's) serializes with camelCase field names. All entities are
//! request-scoped; the only value that outlives a request is the list of
//! [`ProductionRecommendation`]s held by the forecast cache.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default forecast horizon in weeks.
pub const DEFAULT_HORIZON_WEEKS: u32 = 13;

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub collection: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_price: Decimal,
}

/// A raw weekly sales row as stored by the sales history source.
///
/// Carries no derived features; see [`SalesAggregation`] for the enriched form.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub product_id: String,
    pub collection: String,
    pub week: u32,
    pub year: i32,
    pub country: String,
    pub channel: String,
    pub quantity_sold: i64,
    pub revenue: Decimal,
    pub average_price: Decimal,
}

/// One week × product × country × channel observation, enriched with
/// calendar, marketing and economic features.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesAggregation {
    pub product_id: String,
    pub collection: String,
    pub week: u32,
    pub year: i32,
    pub country: String,
    pub channel: String,
    pub quantity_sold: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_price: Decimal,
    pub is_holiday_season: bool,
    /// Distance in weeks to the nearest fashion week.
    pub fashion_week_proximity: u32,
    pub marketing_campaign_active: bool,
    pub economic_index: f64,
}

/// Enriched historical sales for a time window.
#[derive(Debug, Clone, Default)]
pub struct HistoricalSalesData {
    pub aggregations: Vec<SalesAggregation>,
}

/// Response for GET /api/HistoricalData/prepare-training-data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingDataResponse {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub record_count: usize,
    pub data: Vec<SalesAggregation>,
}

/// Query parameters for GET /api/HistoricalData/prepare-training-data.
///
/// Dates are kept as strings so both `2024-01-31` and RFC 3339 timestamps
/// can be accepted.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingDataQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Request body for POST /api/Forecast.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesPredictionRequest {
    pub product_ids: Vec<String>,

    /// Accepted for compatibility; the forecast always starts today.
    #[serde(default)]
    pub start_date: String,

    #[serde(default = "default_horizon_weeks")]
    pub forecast_horizon_weeks: u32,

    #[serde(default = "default_channel")]
    pub channel: String,

    #[serde(default = "default_countries")]
    pub countries: Vec<String>,
}

/// Request body sent to the forecasting service's `POST /forecast`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamForecastRequest {
    pub product_ids: Vec<String>,
    /// `YYYY-MM-DD`.
    pub start_date: String,
    pub forecast_horizon_weeks: u32,
    pub channel: String,
    pub countries: Vec<String>,
}

/// One product × future-week prediction, as returned by the forecasting service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyForecast {
    pub product_id: String,
    pub week_offset: i32,
    pub predicted_quantity: f64,
    pub confidence_lower: f64,
    pub confidence_upper: f64,
    pub recommended_production: i64,
}

/// Per-product recommendation derived from a sequence of [`WeeklyForecast`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionRecommendation {
    pub product_id: String,
    pub total_predicted_demand: f64,
    /// Sorted ascending by `week_offset`.
    pub weekly_forecasts: Vec<WeeklyForecast>,
    pub recommended_production_quantity: i64,
    /// In `[0, 1]`.
    pub confidence_level: f64,
    /// In `[0, 1]`.
    pub risk_of_stockout: f64,
}

/// Severity of a production alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSeverity {
    High,
    Medium,
}

/// An alert raised for a single product of a production plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionAlert {
    pub severity: AlertSeverity,
    pub product_id: String,
    pub message: String,
    pub recommended_action: String,
}

/// Totals over a ranked production plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionSummary {
    pub total_units_to_produce: i64,
    pub high_priority_items: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub estimated_revenue: Decimal,
}

/// Response for GET /api/ProductionPlanning/recommendations/{collectionId}.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionPlanReport {
    pub collection_id: String,
    pub generated_at: DateTime<Utc>,
    /// Human-readable horizon, e.g. "13 weeks".
    pub forecast_horizon: String,
    pub total_products_analyzed: usize,
    pub recommendations: Vec<ProductionRecommendation>,
    pub alerts: Vec<ProductionAlert>,
    pub summary: ProductionSummary,
}

/// Query parameters for the production plan endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionPlanQuery {
    #[serde(default = "default_horizon_weeks")]
    pub horizon_weeks: u32,
}

fn default_horizon_weeks() -> u32 {
    DEFAULT_HORIZON_WEEKS
}

fn default_channel() -> String {
    "All".to_string()
}

fn default_countries() -> Vec<String> {
    vec!["All".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prediction_request_defaults() {
        let request: SalesPredictionRequest =
            serde_json::from_value(json!({ "productIds": ["BAG-001"] })).unwrap();

        assert_eq!(request.product_ids, vec!["BAG-001"]);
        assert_eq!(request.forecast_horizon_weeks, 13);
        assert_eq!(request.channel, "All");
        assert_eq!(request.countries, vec!["All"]);
        assert!(request.start_date.is_empty());
    }

    #[test]
    fn test_weekly_forecast_wire_names() {
        let forecast: WeeklyForecast = serde_json::from_value(json!({
            "productId": "BAG-001",
            "weekOffset": 2,
            "predictedQuantity": 11.5,
            "confidenceLower": 8.0,
            "confidenceUpper": 15.0,
            "recommendedProduction": 13
        }))
        .unwrap();

        assert_eq!(forecast.week_offset, 2);
        assert_eq!(forecast.recommended_production, 13);
    }

    #[test]
    fn test_summary_serializes_revenue_as_number() {
        let summary = ProductionSummary {
            total_units_to_produce: 37,
            high_priority_items: 0,
            estimated_revenue: Decimal::from(185_000),
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["totalUnitsToProduce"], 37);
        assert_eq!(value["estimatedRevenue"].as_f64(), Some(185_000.0));
    }

    #[test]
    fn test_alert_severity_labels() {
        assert_eq!(serde_json::to_value(AlertSeverity::High).unwrap(), "High");
        assert_eq!(
            serde_json::to_value(AlertSeverity::Medium).unwrap(),
            "Medium"
        );
    }

    #[test]
    fn test_plan_query_default_horizon() {
        let query: ProductionPlanQuery = serde_json::from_value(json!({})).unwrap();
        assert_eq!(query.horizon_weeks, DEFAULT_HORIZON_WEEKS);
    }
}
