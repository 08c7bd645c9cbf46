//! Shared test fixtures: a stub forecasting service and client builders.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use luxforecast::api::AppState;
use luxforecast::cache::InMemoryForecastCache;
use luxforecast::config::ForecastServiceConfig;
use luxforecast::data_sources::{ForecastServiceClient, InMemoryCatalog, InMemorySalesHistory};
use luxforecast::forecast::ForecastClient;
use luxforecast::resilience::ResilienceConfig;

#[derive(Clone)]
struct StubState {
    hits: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<Value>>>,
    failures_before_success: usize,
    failure_status: StatusCode,
    delay: Duration,
    body: Arc<String>,
}

/// An in-process stand-in for the forecasting service's `POST /forecast`.
pub struct ForecastStub {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<Value>>>,
}

impl ForecastStub {
    /// Always answers 200 with `rows`.
    pub async fn serving(rows: Value) -> Self {
        Self::spawn(0, StatusCode::OK, Duration::ZERO, rows.to_string()).await
    }

    /// Always answers with `status`.
    pub async fn failing(status: StatusCode) -> Self {
        Self::spawn(usize::MAX, status, Duration::ZERO, "[]".to_string()).await
    }

    /// Answers `status` for the first `failures` calls, then 200 with `rows`.
    pub async fn flaky(failures: usize, status: StatusCode, rows: Value) -> Self {
        Self::spawn(failures, status, Duration::ZERO, rows.to_string()).await
    }

    /// Answers 200 with an arbitrary body.
    pub async fn raw(body: &str) -> Self {
        Self::spawn(0, StatusCode::OK, Duration::ZERO, body.to_string()).await
    }

    /// Answers 200 with `rows` after `delay`.
    pub async fn slow(delay: Duration, rows: Value) -> Self {
        Self::spawn(0, StatusCode::OK, delay, rows.to_string()).await
    }

    async fn spawn(
        failures_before_success: usize,
        failure_status: StatusCode,
        delay: Duration,
        body: String,
    ) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let last_request = Arc::new(Mutex::new(None));

        let state = StubState {
            hits: hits.clone(),
            last_request: last_request.clone(),
            failures_before_success,
            failure_status,
            delay,
            body: Arc::new(body),
        };

        let app = Router::new()
            .route("/forecast", post(stub_forecast))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            hits,
            last_request,
        }
    }

    /// Number of requests received so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Body of the most recent request.
    pub fn last_request(&self) -> Option<Value> {
        self.last_request.lock().unwrap().clone()
    }
}

async fn stub_forecast(State(state): State<StubState>, Json(body): Json<Value>) -> Response {
    let hit = state.hits.fetch_add(1, Ordering::SeqCst) + 1;
    *state.last_request.lock().unwrap() = Some(body);

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    if hit <= state.failures_before_success {
        return state.failure_status.into_response();
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        state.body.as_str().to_owned(),
    )
        .into_response()
}

/// One weekly prediction row in the service's wire format.
pub fn row(product_id: &str, week: i32, predicted: f64, lower: f64, upper: f64) -> Value {
    json!({
        "productId": product_id,
        "weekOffset": week,
        "predictedQuantity": predicted,
        "confidenceLower": lower,
        "confidenceUpper": upper,
        "recommendedProduction": (predicted * 1.2) as i64
    })
}

/// Predictions for the three demo catalog products.
///
/// Derived values:
///
/// | product | quantity | confidence | risk |
/// |---|---|---|---|
/// | BAG-001 | 37 | ~0.06 | ~0.64 |
/// | BAG-002 | 15 | 0.0 | 1.0 |
/// | BAG-003 | 41 | 0.8 | 0.1 |
pub fn catalog_rows() -> Value {
    json!([
        row("BAG-001", 1, 12.0, 6.0, 18.0),
        row("BAG-001", 0, 10.0, 5.0, 15.0),
        row("BAG-001", 2, 11.0, 5.0, 14.0),
        row("BAG-002", 0, 5.0, 4.0, 15.0),
        row("BAG-002", 1, 5.0, 4.0, 15.0),
        row("BAG-003", 0, 20.0, 18.0, 22.0),
        row("BAG-003", 1, 20.0, 18.0, 22.0),
    ])
}

/// Policies with negligible backoff so retry tests stay fast.
pub fn fast_resilience(max_retries: u32, breaker_threshold: u32) -> ResilienceConfig {
    ResilienceConfig {
        max_retries,
        backoff_base: Duration::from_millis(1),
        breaker_threshold,
        breaker_cooldown: Duration::from_secs(60),
    }
}

pub fn service_client(base_url: &str, resilience: ResilienceConfig) -> ForecastServiceClient {
    ForecastServiceClient::new(&ForecastServiceConfig {
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
        resilience,
    })
    .unwrap()
}

pub fn forecast_client(base_url: &str, resilience: ResilienceConfig) -> ForecastClient {
    ForecastClient::new(
        service_client(base_url, resilience),
        Arc::new(InMemoryForecastCache::new()),
    )
}

/// Application state wired to a stub, with the demo catalog and sales history.
pub fn app_state(base_url: &str) -> AppState {
    AppState {
        forecasts: forecast_client(base_url, fast_resilience(2, 5)),
        catalog: Arc::new(InMemoryCatalog::sample()),
        sales: Arc::new(InMemorySalesHistory::sample()),
    }
}
