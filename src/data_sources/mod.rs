//! External collaborators: the forecasting service, the product catalog and
//! the sales history.
//!
//! # Data Sources
//!
//! - [`forecast_service`]: HTTP client for the demand forecasting service
//! - [`catalog`]: product metadata per collection
//! - [`sales`]: raw weekly sales rows
//!
//! The catalog and sales history are traits so a real storage backend can
//! replace the in-memory demo data without touching the derivation logic.

pub mod catalog;
pub mod forecast_service;
pub mod sales;

pub use catalog::{InMemoryCatalog, ProductCatalog};
pub use forecast_service::ForecastServiceClient;
pub use sales::{InMemorySalesHistory, SalesHistorySource};
