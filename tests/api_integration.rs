//! Integration tests for the luxforecast HTTP API.
//!
//! These tests verify the full request/response cycle through the router,
//! with a stub forecasting service listening on a local port.

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};

use common::{ForecastStub, app_state, catalog_rows};
use luxforecast::api::router;

fn create_test_server(stub: &ForecastStub) -> TestServer {
    TestServer::new(router(app_state(&stub.base_url))).unwrap()
}

fn product_ids(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|r| r["productId"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_endpoint() {
    let stub = ForecastStub::serving(catalog_rows()).await;
    let server = create_test_server(&stub);

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["forecastService"], "closed");
}

#[tokio::test]
async fn test_post_forecast() {
    let stub = ForecastStub::serving(catalog_rows()).await;
    let server = create_test_server(&stub);

    let response = server
        .post("/api/Forecast")
        .json(&json!({
            "productIds": ["BAG-001", "BAG-002", "BAG-003"],
            "startDate": "2025-03-01",
            "forecastHorizonWeeks": 3
        }))
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(product_ids(&body), vec!["BAG-001", "BAG-002", "BAG-003"]);

    let bag = &body[0];
    assert_eq!(bag["recommendedProductionQuantity"], 37);
    assert_eq!(bag["totalPredictedDemand"].as_f64(), Some(33.0));

    let weeks: Vec<i64> = bag["weeklyForecasts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["weekOffset"].as_i64().unwrap())
        .collect();
    assert_eq!(weeks, vec![0, 1, 2]);

    assert_eq!(body[1]["riskOfStockout"].as_f64(), Some(1.0));
    assert_eq!(body[1]["confidenceLevel"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn test_post_forecast_sends_upstream_request() {
    let stub = ForecastStub::serving(catalog_rows()).await;
    let server = create_test_server(&stub);

    server
        .post("/api/Forecast")
        .json(&json!({
            "productIds": ["BAG-001"],
            "channel": "Boutique",
            "countries": ["FR", "JP"]
        }))
        .await
        .assert_status_ok();

    let sent = stub.last_request().unwrap();
    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();

    assert_eq!(sent["productIds"], json!(["BAG-001"]));
    assert_eq!(sent["forecastHorizonWeeks"], 13); // Default value
    assert_eq!(sent["startDate"], today);
    assert_eq!(sent["channel"], "Boutique");
    assert_eq!(sent["countries"], json!(["FR", "JP"]));
}

#[tokio::test]
async fn test_post_forecast_is_cached() {
    let stub = ForecastStub::serving(catalog_rows()).await;
    let server = create_test_server(&stub);
    let request = json!({
        "productIds": ["BAG-001", "BAG-002"],
        "forecastHorizonWeeks": 8
    });

    let first = server.post("/api/Forecast").json(&request).await;
    let second = server.post("/api/Forecast").json(&request).await;

    first.assert_status_ok();
    second.assert_status_ok();
    assert_eq!(first.json::<Value>(), second.json::<Value>());
    assert_eq!(stub.hits(), 1);

    // A different horizon is a different cache entry
    server
        .post("/api/Forecast")
        .json(&json!({
            "productIds": ["BAG-001", "BAG-002"],
            "forecastHorizonWeeks": 4
        }))
        .await
        .assert_status_ok();
    assert_eq!(stub.hits(), 2);
}

#[tokio::test]
async fn test_post_forecast_upstream_failure() {
    let stub = ForecastStub::failing(StatusCode::SERVICE_UNAVAILABLE).await;
    let server = create_test_server(&stub);

    let response = server
        .post("/api/Forecast")
        .json(&json!({ "productIds": ["BAG-001"] }))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json();
    assert_eq!(body["error"], "Error generating forecast");
    assert!(!body["details"].as_str().unwrap().is_empty());

    // Initial attempt plus two retries
    assert_eq!(stub.hits(), 3);
}

#[tokio::test]
async fn test_production_plan() {
    let stub = ForecastStub::serving(catalog_rows()).await;
    let server = create_test_server(&stub);

    let response = server
        .get("/api/ProductionPlanning/recommendations/SS-2025")
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["collectionId"], "SS-2025");
    assert_eq!(body["forecastHorizon"], "13 weeks");
    assert_eq!(body["totalProductsAnalyzed"], 3);
    assert!(body["generatedAt"].is_string());

    assert_eq!(
        product_ids(&body["recommendations"]),
        vec!["BAG-002", "BAG-001", "BAG-003"]
    );

    let alerts: Vec<(&str, &str)> = body["alerts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| {
            (
                a["productId"].as_str().unwrap(),
                a["severity"].as_str().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        alerts,
        vec![
            ("BAG-002", "High"),
            ("BAG-002", "Medium"),
            ("BAG-001", "Medium"),
        ]
    );
    assert_eq!(body["alerts"][0]["message"], "High stockout risk (probability: 100%)");
    assert_eq!(body["alerts"][0]["recommendedAction"], "Increase production immediately");

    let summary = &body["summary"];
    assert_eq!(summary["totalUnitsToProduce"], 93);
    assert_eq!(summary["highPriorityItems"], 1);
    assert_eq!(summary["estimatedRevenue"].as_f64(), Some(508_500.0));

    // The plan forecasts exactly the catalog's products
    let sent = stub.last_request().unwrap();
    assert_eq!(sent["productIds"], json!(["BAG-001", "BAG-002", "BAG-003"]));
}

#[tokio::test]
async fn test_production_plan_custom_horizon() {
    let stub = ForecastStub::serving(catalog_rows()).await;
    let server = create_test_server(&stub);

    let response = server
        .get("/api/ProductionPlanning/recommendations/AW-2025?horizonWeeks=26")
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["forecastHorizon"], "26 weeks");
    assert_eq!(stub.last_request().unwrap()["forecastHorizonWeeks"], 26);
}

#[tokio::test]
async fn test_production_plan_upstream_failure() {
    let stub = ForecastStub::failing(StatusCode::INTERNAL_SERVER_ERROR).await;
    let server = create_test_server(&stub);

    let response = server
        .get("/api/ProductionPlanning/recommendations/SS-2025")
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json();
    assert_eq!(body["error"], "Error generating production plan");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn test_training_data_default_window() {
    let stub = ForecastStub::serving(catalog_rows()).await;
    let server = create_test_server(&stub);

    let response = server
        .get("/api/HistoricalData/prepare-training-data")
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["recordCount"], 2);
    assert!(body["startDate"].is_string());
    assert!(body["endDate"].is_string());

    let first = &body["data"][0];
    assert_eq!(first["productId"], "BAG-001");
    assert_eq!(first["week"], 15);
    assert_eq!(first["isHolidaySeason"], false);
    assert_eq!(first["fashionWeekProximity"], 7);
    assert_eq!(first["marketingCampaignActive"], false);
    assert_eq!(first["economicIndex"].as_f64(), Some(1.0));

    // Training data never touches the forecasting service
    assert_eq!(stub.hits(), 0);
}

#[tokio::test]
async fn test_training_data_explicit_window() {
    let stub = ForecastStub::serving(catalog_rows()).await;
    let server = create_test_server(&stub);

    let response = server
        .get("/api/HistoricalData/prepare-training-data?startDate=2024-01-01&endDate=2024-06-30")
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["startDate"], "2024-01-01T00:00:00Z");
    assert_eq!(body["endDate"], "2024-06-30T00:00:00Z");
    assert_eq!(body["recordCount"], 2);
}

#[tokio::test]
async fn test_training_data_invalid_date() {
    let stub = ForecastStub::serving(catalog_rows()).await;
    let server = create_test_server(&stub);

    let response = server
        .get("/api/HistoricalData/prepare-training-data?startDate=yesterday")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid startDate");
}

#[tokio::test]
async fn test_full_workflow() {
    let stub = ForecastStub::serving(catalog_rows()).await;
    let server = create_test_server(&stub);

    // 1. Health check
    server.get("/health").await.assert_status_ok();

    // 2. Training data
    server
        .get("/api/HistoricalData/prepare-training-data")
        .await
        .assert_status_ok();

    // 3. Forecast the catalog explicitly
    let forecast = server
        .post("/api/Forecast")
        .json(&json!({ "productIds": ["BAG-001", "BAG-002", "BAG-003"] }))
        .await;
    forecast.assert_status_ok();

    // 4. The plan for the same products and horizon is served from the cache
    let plan = server
        .get("/api/ProductionPlanning/recommendations/SS-2025")
        .await;
    plan.assert_status_ok();
    assert_eq!(stub.hits(), 1);

    let plan: Value = plan.json();
    assert_eq!(plan["recommendations"].as_array().unwrap().len(), 3);

    // 5. Circuit is still closed
    let health: Value = server.get("/health").await.json();
    assert_eq!(health["forecastService"], "closed");
}

#[tokio::test]
async fn test_post_forecast_missing_product_ids() {
    let stub = ForecastStub::serving(catalog_rows()).await;
    let server = create_test_server(&stub);

    let response = server
        .post("/api/Forecast")
        .json(&json!({ "forecastHorizonWeeks": 3 }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid request body");
    assert!(body["details"].as_str().unwrap().contains("productIds"));
    assert_eq!(stub.hits(), 0);
}

#[tokio::test]
async fn test_post_forecast_wrong_field_type() {
    let stub = ForecastStub::serving(catalog_rows()).await;
    let server = create_test_server(&stub);

    let response = server
        .post("/api/Forecast")
        .json(&json!({ "productIds": "BAG-001" }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid request body");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn test_production_plan_invalid_horizon() {
    let stub = ForecastStub::serving(catalog_rows()).await;
    let server = create_test_server(&stub);

    let response = server
        .get("/api/ProductionPlanning/recommendations/SS-2025?horizonWeeks=abc")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid query string");
    assert!(!body["details"].as_str().unwrap().is_empty());
    assert_eq!(stub.hits(), 0);
}
