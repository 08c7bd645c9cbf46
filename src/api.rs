//! HTTP API handlers for luxforecast.
//!
//! # Routes
//!
//! - `POST /api/Forecast` - Recommendations for an explicit product list
//! - `GET /api/ProductionPlanning/recommendations/:collection_id` - Ranked production plan
//! - `GET /api/HistoricalData/prepare-training-data` - Enriched historical sales
//! - `GET /health` - Health check
//!
//! Any failure inside a handler, malformed bodies and query strings included,
//! is logged and answered with a JSON body of the form
//! `{"error": "...", "details": "..."}`.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts, Path, Query, State},
    routing::{get, post},
};
use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, instrument};

use crate::aggregation::prepare_training_data;
use crate::cache::InMemoryForecastCache;
use crate::config::Config;
use crate::data_sources::{
    ForecastServiceClient, InMemoryCatalog, InMemorySalesHistory, ProductCatalog,
    SalesHistorySource,
};
use crate::error::ApiError;
use crate::forecast::{ForecastClient, ForecastScope};
use crate::model::{
    ProductionPlanQuery, ProductionPlanReport, ProductionRecommendation, SalesPredictionRequest,
    TrainingDataQuery, TrainingDataResponse,
};
use crate::planning::build_production_plan;
use crate::resilience::CircuitState;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub forecasts: ForecastClient,
    pub catalog: Arc<dyn ProductCatalog>,
    pub sales: Arc<dyn SalesHistorySource>,
}

impl AppState {
    /// State backed by the demo catalog and sales history and a fresh cache.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let service = ForecastServiceClient::new(&config.forecast_service)?;
        let forecasts = ForecastClient::new(service, Arc::new(InMemoryForecastCache::new()))
            .with_cache_ttl(config.forecast_cache_ttl);

        Ok(Self {
            forecasts,
            catalog: Arc::new(InMemoryCatalog::sample()),
            sales: Arc::new(InMemorySalesHistory::sample()),
        })
    }
}

/// JSON body extractor whose rejections render as [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections render as [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Build the full router, middleware included.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/Forecast", post(post_forecast))
        .route(
            "/ProductionPlanning/recommendations/:collection_id",
            get(get_production_plan),
        )
        .route(
            "/HistoricalData/prepare-training-data",
            get(get_training_data),
        );

    Router::new()
        .nest("/api", api)
        .route("/health", get(health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// POST /api/Forecast - Recommendations for a list of products.
///
/// # Request Body
///
/// ```json
/// {
///     "productIds": ["BAG-001", "BAG-002"],
///     "startDate": "2025-03-01",
///     "forecastHorizonWeeks": 13
/// }
/// ```
///
/// `forecastHorizonWeeks` defaults to 13. `channel` and `countries` are
/// optional and forwarded to the forecasting service.
#[instrument(skip(state, request), fields(products = request.product_ids.len(), horizon = request.forecast_horizon_weeks))]
pub async fn post_forecast(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SalesPredictionRequest>,
) -> Result<Json<Vec<ProductionRecommendation>>, ApiError> {
    let scope = ForecastScope {
        channel: request.channel,
        countries: request.countries,
    };

    match state
        .forecasts
        .get_forecast_scoped(&request.product_ids, request.forecast_horizon_weeks, &scope)
        .await
    {
        Ok(recommendations) => {
            info!(
                recommendations = recommendations.len(),
                "Forecast served"
            );
            Ok(Json(recommendations))
        }
        Err(e) => {
            error!(error = %e, "Error generating forecast");
            Err(ApiError::internal("Error generating forecast", e))
        }
    }
}

/// GET /api/ProductionPlanning/recommendations/:collection_id - Ranked plan.
///
/// # Query Parameters
///
/// - `horizonWeeks` (optional): Forecast horizon in weeks (default: 13)
#[instrument(skip(state))]
pub async fn get_production_plan(
    State(state): State<AppState>,
    Path(collection_id): Path<String>,
    ApiQuery(query): ApiQuery<ProductionPlanQuery>,
) -> Result<Json<ProductionPlanReport>, ApiError> {
    match build_production_plan(
        state.catalog.as_ref(),
        &state.forecasts,
        &collection_id,
        query.horizon_weeks,
    )
    .await
    {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            error!(
                collection = %collection_id,
                error = %e,
                "Error generating production plan"
            );
            Err(ApiError::internal("Error generating production plan", e))
        }
    }
}

/// GET /api/HistoricalData/prepare-training-data - Enriched sales rows.
///
/// # Query Parameters
///
/// - `startDate` (optional): `YYYY-MM-DD` or RFC 3339 (default: two years ago)
/// - `endDate` (optional): `YYYY-MM-DD` or RFC 3339 (default: now)
#[instrument(skip(state))]
pub async fn get_training_data(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TrainingDataQuery>,
) -> Result<Json<TrainingDataResponse>, ApiError> {
    let now = Utc::now();

    let end = match query.end_date.as_deref() {
        Some(raw) => parse_query_date(raw)
            .map_err(|e| ApiError::bad_request("Invalid endDate", e))?,
        None => now,
    };
    let start = match query.start_date.as_deref() {
        Some(raw) => parse_query_date(raw)
            .map_err(|e| ApiError::bad_request("Invalid startDate", e))?,
        None => now
            .checked_sub_months(Months::new(24))
            .unwrap_or(now - chrono::Duration::days(730)),
    };

    match prepare_training_data(state.sales.as_ref(), start, end).await {
        Ok(data) => Ok(Json(TrainingDataResponse {
            start_date: start,
            end_date: end,
            record_count: data.aggregations.len(),
            data: data.aggregations,
        })),
        Err(e) => {
            error!(error = %e, "Error preparing training data");
            Err(ApiError::internal("Error preparing training data", e))
        }
    }
}

/// Response for GET /health.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub forecast_service: CircuitState,
}

/// GET /health - Liveness plus the forecasting service's circuit state.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        forecast_service: state.forecasts.service().circuit_state(),
    })
}

/// Accept RFC 3339, `YYYY-MM-DDTHH:MM:SS` (taken as UTC) or `YYYY-MM-DD` (midnight UTC).
fn parse_query_date(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|date| date.and_time(NaiveTime::default()).and_utc())
}
