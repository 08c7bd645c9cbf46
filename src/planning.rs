//! Production planning: ranks a collection's recommendations into a report.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::data_sources::ProductCatalog;
use crate::forecast::ForecastClient;
use crate::model::{Product, ProductionPlanReport, ProductionRecommendation, ProductionSummary};
use crate::optimization::{calculate_estimated_revenue, generate_alerts};

/// Stockout risk above which an item counts as high priority in the summary.
///
/// Deliberately lower than the High alert threshold.
pub const HIGH_PRIORITY_RISK_THRESHOLD: f64 = 0.7;

/// Build the production plan for a collection.
///
/// 1. Load the collection's products from the catalog.
/// 2. Forecast exactly those product ids.
/// 3. Rank, then derive alerts and the summary.
#[instrument(skip(catalog, forecasts))]
pub async fn build_production_plan(
    catalog: &dyn ProductCatalog,
    forecasts: &ForecastClient,
    collection_id: &str,
    horizon_weeks: u32,
) -> anyhow::Result<ProductionPlanReport> {
    let products = catalog.products_for_collection(collection_id).await?;
    let product_ids: Vec<String> = products.iter().map(|p| p.id.clone()).collect();

    let recommendations = forecasts.get_forecast(&product_ids, horizon_weeks).await?;

    let report = assemble_report(
        collection_id,
        horizon_weeks,
        &products,
        recommendations,
        Utc::now(),
    );

    info!(
        collection = %collection_id,
        products = report.total_products_analyzed,
        alerts = report.alerts.len(),
        high_priority = report.summary.high_priority_items,
        "Production plan generated"
    );

    Ok(report)
}

/// Rank recommendations and compute alerts and totals.
pub fn assemble_report(
    collection_id: &str,
    horizon_weeks: u32,
    products: &[Product],
    mut recommendations: Vec<ProductionRecommendation>,
    generated_at: DateTime<Utc>,
) -> ProductionPlanReport {
    rank_recommendations(&mut recommendations);

    let alerts = generate_alerts(&recommendations);
    let summary = ProductionSummary {
        total_units_to_produce: recommendations
            .iter()
            .map(|r| r.recommended_production_quantity)
            .sum(),
        high_priority_items: recommendations
            .iter()
            .filter(|r| r.risk_of_stockout > HIGH_PRIORITY_RISK_THRESHOLD)
            .count(),
        estimated_revenue: calculate_estimated_revenue(&recommendations, products),
    };

    ProductionPlanReport {
        collection_id: collection_id.to_string(),
        generated_at,
        forecast_horizon: format!("{} weeks", horizon_weeks),
        total_products_analyzed: products.len(),
        recommendations,
        alerts,
        summary,
    }
}

/// Stable sort: stockout risk descending, then total predicted demand
/// descending, then confidence ascending.
pub fn rank_recommendations(recommendations: &mut [ProductionRecommendation]) {
    recommendations.sort_by(|a, b| {
        cmp_f64(b.risk_of_stockout, a.risk_of_stockout)
            .then_with(|| cmp_f64(b.total_predicted_demand, a.total_predicted_demand))
            .then_with(|| cmp_f64(a.confidence_level, b.confidence_level))
    });
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
