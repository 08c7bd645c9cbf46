//! Luxforecast - sales forecasting and production planning for luxury collections.
//!
//! # API Endpoints
//!
//! - `POST /api/Forecast` - Production recommendations for a product list
//! - `GET /api/ProductionPlanning/recommendations/:collection_id` - Ranked production plan
//! - `GET /api/HistoricalData/prepare-training-data` - Enriched historical sales
//! - `GET /health` - Health check
//!
//! Configuration is read from `LUXFORECAST_*` environment variables; see
//! [`luxforecast::config::Config`].

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use luxforecast::api::{AppState, router};
use luxforecast::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment filter
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("luxforecast=info".parse()?))
        .init();

    let config = Config::from_env();

    info!(
        port = config.port,
        forecast_service = %config.forecast_service.base_url,
        timeout_secs = config.forecast_service.timeout.as_secs(),
        max_retries = config.forecast_service.resilience.max_retries,
        cache_ttl_secs = config.forecast_cache_ttl.as_secs(),
        "Starting luxforecast server"
    );

    let state = AppState::from_config(&config)?;
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Luxforecast is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
