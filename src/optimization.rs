//! Alerting and revenue estimation over production recommendations.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::model::{AlertSeverity, Product, ProductionAlert, ProductionRecommendation};

/// Stockout risk above which a High alert is raised.
pub const HIGH_RISK_ALERT_THRESHOLD: f64 = 0.8;

/// Confidence below which a Medium alert is raised.
pub const LOW_CONFIDENCE_ALERT_THRESHOLD: f64 = 0.6;

/// Generate alerts for a list of recommendations.
///
/// Each recommendation may produce a High alert (stockout risk strictly above
/// 0.8), a Medium alert (confidence strictly below 0.6), both, or none.
/// Alerts follow the order of `recommendations`, High before Medium.
pub fn generate_alerts(recommendations: &[ProductionRecommendation]) -> Vec<ProductionAlert> {
    let mut alerts = Vec::new();

    for rec in recommendations {
        if rec.risk_of_stockout > HIGH_RISK_ALERT_THRESHOLD {
            alerts.push(ProductionAlert {
                severity: AlertSeverity::High,
                product_id: rec.product_id.clone(),
                message: format!(
                    "High stockout risk (probability: {})",
                    format_percent(rec.risk_of_stockout)
                ),
                recommended_action: "Increase production immediately".to_string(),
            });
        }

        if rec.confidence_level < LOW_CONFIDENCE_ALERT_THRESHOLD {
            alerts.push(ProductionAlert {
                severity: AlertSeverity::Medium,
                product_id: rec.product_id.clone(),
                message: "Prediction with high uncertainty".to_string(),
                recommended_action: "Monitor actual sales closely".to_string(),
            });
        }
    }

    alerts
}

/// Sum of `recommended quantity × catalog price` over all recommendations.
///
/// Recommendations whose product is not in `products` contribute nothing.
pub fn calculate_estimated_revenue(
    recommendations: &[ProductionRecommendation],
    products: &[Product],
) -> Decimal {
    let prices: HashMap<&str, Decimal> = products
        .iter()
        .map(|p| (p.id.as_str(), p.average_price))
        .collect();

    recommendations
        .iter()
        .filter_map(|rec| {
            prices
                .get(rec.product_id.as_str())
                .map(|&price| Decimal::from(rec.recommended_production_quantity) * price)
        })
        .sum()
}

/// Format a ratio as a whole percentage, e.g. `0.856` -> `"86%"`.
fn format_percent(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}
