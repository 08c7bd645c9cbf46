//! Luxforecast - sales forecasting and production planning for luxury collections.
//!
//! # Overview
//!
//! Luxforecast sits in front of an external demand forecasting service. It
//! turns the service's weekly predictions into per-product production
//! recommendations (recommended quantity, confidence, stockout risk), ranks
//! them into a production plan per collection, and raises alerts for products
//! at risk.
//!
//! # Modules
//!
//! - [`model`]: Request, response and domain types
//! - [`config`]: Environment-driven configuration
//! - [`error`]: Service and HTTP error types
//! - [`resilience`]: Retry with backoff and circuit breaking for upstream calls
//! - [`cache`]: Forecast cache with per-entry TTL
//! - [`data_sources`]: Forecasting service client, product catalog, sales history
//! - [`aggregation`]: Feature enrichment for historical sales
//! - [`forecast`]: Recommendation derivation and cached forecast access
//! - [`optimization`]: Alerts and revenue estimation
//! - [`planning`]: Ranked production plans
//! - [`api`]: HTTP API handlers

pub mod aggregation;
pub mod api;
pub mod cache;
pub mod config;
pub mod data_sources;
pub mod error;
pub mod forecast;
pub mod model;
pub mod optimization;
pub mod planning;
pub mod resilience;
