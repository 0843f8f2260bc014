//! Catalog endpoints end to end.

use axum::http::StatusCode;
use ruway_integration_tests::{TestApp, fixtures};
use serde_json::json;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ids(body: &serde_json::Value) -> Vec<String> {
    body["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|p| p["id"].as_str().expect("id").to_string())
        .collect()
}

#[tokio::test]
async fn health_is_ok() {
    let mut app = TestApp::spawn().await;
    let response = app.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!("ok"));
}

#[tokio::test]
async fn lists_every_product() {
    let mut app = TestApp::spawn().await;

    let response = app.get("/products").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["unavailable"], false);
    assert_eq!(ids(&response.body).len(), 5);
}

#[tokio::test]
async fn search_and_category_filters() {
    let mut app = TestApp::spawn().await;

    let response = app.get("/products?q=ESP").await;
    assert_eq!(ids(&response.body), [fixtures::ESP32]);

    let response = app.get("/products?category=herramientas").await;
    assert_eq!(
        ids(&response.body),
        [
            fixtures::OSCILLOSCOPE,
            fixtures::POWER_SUPPLY,
            fixtures::SOLDERING_STATION
        ]
    );

    let response = app.get("/products?q=digital&category=herramientas").await;
    assert_eq!(
        ids(&response.body),
        [fixtures::OSCILLOSCOPE, fixtures::SOLDERING_STATION]
    );
}

#[tokio::test]
async fn product_detail_by_id_or_sku() {
    let mut app = TestApp::spawn().await;

    let response = app.get("/products/a1").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["product"]["name"], "ESP32 DevKit");

    let response = app.get("/products/002001").await;
    assert_eq!(response.body["product"]["id"], fixtures::OSCILLOSCOPE);

    let response = app.get("/products/missing").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "Product not found");
}

#[tokio::test]
async fn out_of_stock_products_are_labelled() {
    let mut app = TestApp::spawn().await;

    let response = app.get("/products/a5").await;

    assert_eq!(response.body["product"]["stockStatus"], "out_of_stock");
}

#[tokio::test]
async fn categories_and_settings() {
    let mut app = TestApp::spawn().await;

    let response = app.get("/categories").await;
    assert_eq!(response.body["items"].as_array().map(Vec::len), Some(2));

    let response = app.get("/settings").await;
    assert_eq!(response.body["company_name"], "Ruway Electronics");
    assert_eq!(response.body["yape_qr"], "https://cdn.ruway.pe/yape-qr.png");
}

#[tokio::test]
async fn unreachable_backend_degrades_to_unavailable() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&backend)
        .await;
    let mut app = TestApp::with_backend(backend);

    let response = app.get("/products").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["unavailable"], true);
    assert_eq!(response.body["items"], json!([]));

    let response = app.get("/products/a1").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["unavailable"], true);
    assert!(response.body["product"].is_null());

    let response = app.get("/settings").await;
    assert_eq!(response.body["company_name"], "Ruway Electronics");
}

#[tokio::test]
async fn responses_carry_security_headers_and_request_id() {
    let mut app = TestApp::spawn().await;

    let response = app.get("/products").await;

    assert_eq!(response.headers["x-frame-options"], "DENY");
    assert_eq!(response.headers["x-content-type-options"], "nosniff");
    assert!(response.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn catalog_refresh_is_for_the_administrator_only() {
    let mut app = TestApp::spawn().await;

    let response = app.post_empty("/catalog/refresh").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    app.sign_in().await;
    let response = app.post_empty("/catalog/refresh").await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn catalog_refresh_refetches_products() {
    let mut app = TestApp::spawn().await;
    app.get("/products").await;
    app.get("/products").await;
    assert_eq!(app.backend_hits("/rest/v1/products").await, 1);

    let admin = app.sign_in_as_admin().await;
    assert_eq!(admin.body["user"]["is_admin"], true);

    let response = app.post_empty("/catalog/refresh").await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let listing = app.get("/products").await;
    assert_eq!(listing.body["items"].as_array().map(Vec::len), Some(5));
    assert_eq!(app.backend_hits("/rest/v1/products").await, 2);
}
