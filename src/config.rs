//! Runtime configuration loaded from environment variables.
//!
//! Every setting has a default, so the server starts with an empty
//! environment. Values that fail to parse fall back to the default and log a
//! warning.

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::resilience::ResilienceConfig;

/// Default port if not specified via environment variable.
pub const DEFAULT_PORT: u16 = 5000;

/// Default base URL of the forecasting service.
pub const DEFAULT_ML_BASE_URL: &str = "http://localhost:8000";

/// Default lifetime of a cached forecast (6 hours).
pub const DEFAULT_FORECAST_CACHE_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Settings for the upstream forecasting service client.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastServiceConfig {
    pub base_url: String,
    /// Bound on a single request, connection included.
    pub timeout: Duration,
    pub resilience: ResilienceConfig,
}

impl Default for ForecastServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ML_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            resilience: ResilienceConfig::default(),
        }
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub forecast_service: ForecastServiceConfig,
    pub forecast_cache_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            forecast_service: ForecastServiceConfig::default(),
            forecast_cache_ttl: DEFAULT_FORECAST_CACHE_TTL,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Recognised keys:
    ///
    /// - `LUXFORECAST_PORT`
    /// - `LUXFORECAST_ML_BASE_URL`
    /// - `LUXFORECAST_ML_TIMEOUT_SECS`
    /// - `LUXFORECAST_ML_MAX_RETRIES`
    /// - `LUXFORECAST_ML_BACKOFF_BASE_MS`
    /// - `LUXFORECAST_ML_BREAKER_THRESHOLD`
    /// - `LUXFORECAST_ML_BREAKER_COOLDOWN_SECS`
    /// - `LUXFORECAST_FORECAST_CACHE_TTL_SECS`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let service = &defaults.forecast_service;
        let resilience = &service.resilience;

        let base_url = lookup("LUXFORECAST_ML_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| service.base_url.clone());

        Self {
            port: parse_or(&lookup, "LUXFORECAST_PORT", defaults.port),
            forecast_service: ForecastServiceConfig {
                base_url,
                timeout: Duration::from_secs(parse_or(
                    &lookup,
                    "LUXFORECAST_ML_TIMEOUT_SECS",
                    service.timeout.as_secs(),
                )),
                resilience: ResilienceConfig {
                    max_retries: parse_or(
                        &lookup,
                        "LUXFORECAST_ML_MAX_RETRIES",
                        resilience.max_retries,
                    ),
                    backoff_base: Duration::from_millis(parse_or(
                        &lookup,
                        "LUXFORECAST_ML_BACKOFF_BASE_MS",
                        resilience.backoff_base.as_millis() as u64,
                    )),
                    breaker_threshold: parse_or(
                        &lookup,
                        "LUXFORECAST_ML_BREAKER_THRESHOLD",
                        resilience.breaker_threshold,
                    ),
                    breaker_cooldown: Duration::from_secs(parse_or(
                        &lookup,
                        "LUXFORECAST_ML_BREAKER_COOLDOWN_SECS",
                        resilience.breaker_cooldown.as_secs(),
                    )),
                },
            },
            forecast_cache_ttl: Duration::from_secs(parse_or(
                &lookup,
                "LUXFORECAST_FORECAST_CACHE_TTL_SECS",
                defaults.forecast_cache_ttl.as_secs(),
            )),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = %raw, "Ignoring unparseable configuration value");
                default
            }
        },
        None => default,
    }
}
