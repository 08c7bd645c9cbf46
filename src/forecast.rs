//! Forecast client: turns raw weekly predictions into production recommendations.
//!
//! # Derivation
//!
//! For each product, over its weekly predictions:
//!
//! - `recommended = ceil(sum(predicted) + 0.5 * (max(upper) - avg(predicted)))`
//! - `confidence  = clamp(1 - avg(upper - lower) / avg(predicted), 0, 1)`
//! - `risk        = clamp((max(upper) - avg(predicted)) / avg(predicted), 0, 1)`
//!
//! Confidence and risk are 0 when the average prediction is 0.
//!
//! Results are cached per (product id list, horizon). A cache hit never
//! reaches the forecasting service.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, instrument};

use crate::cache::{ForecastCache, forecast_cache_key};
use crate::config::DEFAULT_FORECAST_CACHE_TTL;
use crate::data_sources::ForecastServiceClient;
use crate::error::ServiceError;
use crate::model::{ProductionRecommendation, UpstreamForecastRequest, WeeklyForecast};

/// Share of the widest upper-bound excursion kept as safety stock.
const SAFETY_STOCK_FACTOR: f64 = 0.5;

/// Optional request attributes forwarded to the forecasting service.
#[derive(Debug, Clone)]
pub struct ForecastScope {
    pub channel: String,
    pub countries: Vec<String>,
}

impl Default for ForecastScope {
    fn default() -> Self {
        Self {
            channel: "All".to_string(),
            countries: vec!["All".to_string()],
        }
    }
}

/// Cached access to the forecasting service.
#[derive(Clone)]
pub struct ForecastClient {
    service: ForecastServiceClient,
    cache: Arc<dyn ForecastCache>,
    cache_ttl: Duration,
}

impl ForecastClient {
    pub fn new(service: ForecastServiceClient, cache: Arc<dyn ForecastCache>) -> Self {
        Self {
            service,
            cache,
            cache_ttl: DEFAULT_FORECAST_CACHE_TTL,
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn service(&self) -> &ForecastServiceClient {
        &self.service
    }

    /// One recommendation per product id present in the service's response.
    pub async fn get_forecast(
        &self,
        product_ids: &[String],
        horizon_weeks: u32,
    ) -> Result<Vec<ProductionRecommendation>, ServiceError> {
        self.get_forecast_scoped(product_ids, horizon_weeks, &ForecastScope::default())
            .await
    }

    /// Like [`get_forecast`](Self::get_forecast) with an explicit channel and country scope.
    ///
    /// The scope is forwarded to the service but is not part of the cache key.
    #[instrument(skip(self, product_ids, scope), fields(products = product_ids.len()))]
    pub async fn get_forecast_scoped(
        &self,
        product_ids: &[String],
        horizon_weeks: u32,
        scope: &ForecastScope,
    ) -> Result<Vec<ProductionRecommendation>, ServiceError> {
        let key = forecast_cache_key(product_ids, horizon_weeks);

        if let Some(cached) = self.cache.get(&key) {
            info!(key = %key, "Returning cached forecast");
            return Ok(cached);
        }

        let request = UpstreamForecastRequest {
            product_ids: product_ids.to_vec(),
            start_date: Utc::now().format("%Y-%m-%d").to_string(),
            forecast_horizon_weeks: horizon_weeks,
            channel: scope.channel.clone(),
            countries: scope.countries.clone(),
        };

        let forecasts = self.service.forecast(&request).await?;
        let recommendations = build_recommendations(forecasts);

        info!(
            key = %key,
            recommendations = recommendations.len(),
            "Forecast computed"
        );

        self.cache.set(&key, recommendations.clone(), self.cache_ttl);
        Ok(recommendations)
    }
}

/// Group weekly predictions by product and derive one recommendation per group.
///
/// Groups appear in order of each product's first row in `forecasts`.
pub fn build_recommendations(forecasts: Vec<WeeklyForecast>) -> Vec<ProductionRecommendation> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<WeeklyForecast>> = Vec::new();

    for forecast in forecasts {
        match index.get(&forecast.product_id) {
            Some(&i) => groups[i].push(forecast),
            None => {
                index.insert(forecast.product_id.clone(), groups.len());
                groups.push(vec![forecast]);
            }
        }
    }

    groups
        .into_iter()
        .filter_map(recommend_for_product)
        .collect()
}

/// Derive a recommendation from one product's weekly predictions.
///
/// Returns `None` for an empty group.
pub fn recommend_for_product(
    mut weekly: Vec<WeeklyForecast>,
) -> Option<ProductionRecommendation> {
    let product_id = weekly.first()?.product_id.clone();
    weekly.sort_by_key(|f| f.week_offset);

    let stats = GroupStats::from_forecasts(&weekly);

    Some(ProductionRecommendation {
        product_id,
        total_predicted_demand: stats.total_predicted,
        recommended_production_quantity: optimal_production(&stats),
        confidence_level: confidence(&stats),
        risk_of_stockout: stockout_risk(&stats),
        weekly_forecasts: weekly,
    })
}

/// Aggregates shared by the three derivations.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GroupStats {
    total_predicted: f64,
    avg_predicted: f64,
    max_upper: f64,
    avg_interval: f64,
}

impl GroupStats {
    fn from_forecasts(forecasts: &[WeeklyForecast]) -> Self {
        let n = forecasts.len().max(1) as f64;
        let total_predicted: f64 = forecasts.iter().map(|f| f.predicted_quantity).sum();
        let total_interval: f64 = forecasts
            .iter()
            .map(|f| f.confidence_upper - f.confidence_lower)
            .sum();
        let max_upper = forecasts
            .iter()
            .map(|f| f.confidence_upper)
            .fold(f64::NEG_INFINITY, f64::max);

        Self {
            total_predicted,
            avg_predicted: total_predicted / n,
            max_upper: if forecasts.is_empty() { 0.0 } else { max_upper },
            avg_interval: total_interval / n,
        }
    }
}

/// Demand plus half of the widest excursion of the upper bound above the mean.
fn optimal_production(stats: &GroupStats) -> i64 {
    let safety_stock = (stats.max_upper - stats.avg_predicted) * SAFETY_STOCK_FACTOR;
    (stats.total_predicted + safety_stock).ceil() as i64
}

fn confidence(stats: &GroupStats) -> f64 {
    if stats.avg_predicted == 0.0 {
        return 0.0;
    }
    let coefficient = stats.avg_interval / stats.avg_predicted;
    clamp_unit(1.0 - coefficient)
}

fn stockout_risk(stats: &GroupStats) -> f64 {
    if stats.avg_predicted == 0.0 {
        return 0.0;
    }
    clamp_unit((stats.max_upper - stats.avg_predicted) / stats.avg_predicted)
}

/// Clamp into `[0, 1]`, mapping NaN to 0.
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
