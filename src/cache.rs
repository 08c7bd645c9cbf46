//! Forecast cache.
//!
//! The cache is injected into the forecast client rather than being a global,
//! so each server (and each test) owns its own instance. Writes are
//! last-writer-wins; two concurrent misses for the same key both compute and
//! both store, which is harmless because the computation is deterministic.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::model::ProductionRecommendation;

/// Upper bound on any entry's lifetime.
const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Key/value store for computed recommendation lists.
pub trait ForecastCache: Send + Sync {
    /// Return the stored list if present and not expired.
    fn get(&self, key: &str) -> Option<Vec<ProductionRecommendation>>;

    /// Store a list for `ttl`, replacing any previous entry.
    fn set(&self, key: &str, value: Vec<ProductionRecommendation>, ttl: Duration);
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<ProductionRecommendation>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Process-wide in-memory cache backed by a concurrent map.
#[derive(Debug, Default)]
pub struct InMemoryForecastCache {
    entries: DashMap<String, CacheEntry>,
}

impl InMemoryForecastCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ForecastCache for InMemoryForecastCache {
    fn get(&self, key: &str) -> Option<Vec<ProductionRecommendation>> {
        {
            let entry = self.entries.get(key)?;
            if !entry.is_expired() {
                return Some(entry.value.clone());
            }
        }

        // The read guard must be released before removing.
        self.entries.remove_if(key, |_, entry| entry.is_expired());
        None
    }

    fn set(&self, key: &str, value: Vec<ProductionRecommendation>, ttl: Duration) {
        let expires_at = Instant::now() + ttl.min(MAX_TTL);
        self.entries
            .insert(key.to_string(), CacheEntry { value, expires_at });
    }
}

/// Cache key for a forecast request: product ids in request order, then the horizon.
pub fn forecast_cache_key(product_ids: &[String], horizon_weeks: u32) -> String {
    format!("forecast_{}_{}", product_ids.join(","), horizon_weeks)
}
