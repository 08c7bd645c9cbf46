//! Client for the external demand forecasting service.
//!
//! The service exposes a single endpoint, `POST /forecast`, that takes a list
//! of product ids and a horizon and answers with a flat list of per-week
//! predictions (see [`WeeklyForecast`]).
//!
//! Every request is bounded by the configured timeout, retried with
//! exponential backoff on connection errors and non-success statuses, and
//! guarded by a circuit breaker shared by all clones of the client.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::config::ForecastServiceConfig;
use crate::error::ServiceError;
use crate::model::{UpstreamForecastRequest, WeeklyForecast};
use crate::resilience::{CircuitBreaker, CircuitState, ResilienceConfig, with_retry};

/// HTTP client for the forecasting service.
#[derive(Clone)]
pub struct ForecastServiceClient {
    client: reqwest::Client,
    base_url: String,
    resilience: ResilienceConfig,
    breaker: Arc<CircuitBreaker>,
}

impl ForecastServiceClient {
    /// Create a client from configuration.
    pub fn new(config: &ForecastServiceConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            breaker: Arc::new(CircuitBreaker::from_config(&config.resilience)),
            resilience: config.resilience.clone(),
        })
    }

    /// Current state of the circuit breaker.
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Request weekly predictions.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] if every attempt fails, the circuit is
    /// open, or the response body is not a list of weekly forecasts.
    #[instrument(skip(self, request), fields(products = request.product_ids.len(), horizon = request.forecast_horizon_weeks))]
    pub async fn forecast(
        &self,
        request: &UpstreamForecastRequest,
    ) -> Result<Vec<WeeklyForecast>, ServiceError> {
        let response = with_retry(&self.resilience, || self.send(request)).await?;

        let forecasts = response
            .json::<Vec<WeeklyForecast>>()
            .await
            .map_err(ServiceError::Decode)?;

        debug!(rows = forecasts.len(), "Forecast service responded");
        Ok(forecasts)
    }

    /// A single attempt, gated by the circuit breaker.
    async fn send(
        &self,
        request: &UpstreamForecastRequest,
    ) -> Result<reqwest::Response, ServiceError> {
        if !self.breaker.try_acquire() {
            return Err(ServiceError::CircuitOpen);
        }

        let url = format!("{}/forecast", self.base_url);
        let outcome = match self.client.post(&url).json(request).send().await {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => Err(ServiceError::UpstreamStatus {
                status: response.status(),
            }),
            Err(e) => Err(ServiceError::from_send(e)),
        };

        // Timeouts neither trip nor close the circuit; they only free a half-open trial slot.
        match &outcome {
            Err(e) if e.is_breaker_failure() => self.breaker.record_failure(),
            Ok(_) | Err(ServiceError::UpstreamStatus { .. }) => self.breaker.record_success(),
            Err(_) => self.breaker.release(),
        }

        outcome
    }
}
