//! Cart endpoints end to end.

use axum::http::StatusCode;
use ruway_core::Price;
use ruway_integration_tests::{TestApp, fixtures, price_of};
use serde_json::{Value, json};

fn quantity_of(cart: &Value, product_id: &str) -> Option<u64> {
    cart["items"]
        .as_array()
        .expect("items array")
        .iter()
        .find(|line| line["product"]["id"] == product_id)
        .and_then(|line| line["quantity"].as_u64())
}

fn line_count(cart: &Value) -> usize {
    cart["items"].as_array().map_or(0, Vec::len)
}

#[tokio::test]
async fn empty_cart_for_new_visitors() {
    let mut app = TestApp::spawn().await;

    let response = app.get("/cart").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["items"], json!([]));
    assert_eq!(response.body["total_items"], 0);
    assert_eq!(price_of(&response.body["total_price"]), Price::ZERO);
    assert_eq!(response.body["drawer_open"], false);
}

#[tokio::test]
async fn adding_twice_merges_into_one_line() {
    let mut app = TestApp::spawn().await;

    let first = app.add_to_cart(fixtures::ESP32, 1).await;
    assert_eq!(first.body["notice"]["kind"], "added");
    assert_eq!(first.body["notice"]["message"], "ESP32 DevKit added to cart");
    assert_eq!(first.body["drawer_open"], true);

    let second = app.add_to_cart(fixtures::ESP32, 2).await;
    assert_eq!(line_count(&second.body), 1);
    assert_eq!(quantity_of(&second.body, fixtures::ESP32), Some(3));
    assert_eq!(second.body["total_items"], 3);
    assert_eq!(price_of(&second.body["total_price"]), Price::from_cents(16_500));
}

#[tokio::test]
async fn quantity_defaults_to_one_and_sku_is_accepted() {
    let mut app = TestApp::spawn().await;

    let response = app.post("/cart/add", json!({"product_id": "001012"})).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(quantity_of(&response.body, fixtures::ARDUINO), Some(1));
}

#[tokio::test]
async fn adding_nothing_reports_no_notice() {
    let mut app = TestApp::spawn().await;

    let response = app
        .post("/cart/add", json!({"product_id": fixtures::ESP32, "quantity": 0}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(line_count(&response.body), 0);
    assert!(response.body.get("notice").is_none());

    app.add_to_cart(fixtures::ESP32, 5).await;
    let response = app
        .post("/cart/add", json!({"product_id": fixtures::ESP32, "quantity": -3}))
        .await;
    assert_eq!(quantity_of(&response.body, fixtures::ESP32), Some(2));
    assert!(response.body.get("notice").is_none());
}

#[tokio::test]
async fn cart_survives_between_requests_in_one_session_only() {
    let mut app = TestApp::spawn().await;
    app.add_to_cart(fixtures::ARDUINO, 2).await;

    let response = app.get("/cart").await;
    assert_eq!(quantity_of(&response.body, fixtures::ARDUINO), Some(2));
    assert_eq!(price_of(&response.body["total_price"]), Price::from_cents(9_100));

    app.clear_cookies();
    let response = app.get("/cart").await;
    assert_eq!(line_count(&response.body), 0);
}

#[tokio::test]
async fn update_sets_absolute_quantity_and_zero_removes() {
    let mut app = TestApp::spawn().await;
    app.add_to_cart(fixtures::ESP32, 3).await;
    app.add_to_cart(fixtures::ARDUINO, 1).await;

    let response = app
        .post("/cart/update", json!({"product_id": fixtures::ESP32, "quantity": 5}))
        .await;
    assert_eq!(quantity_of(&response.body, fixtures::ESP32), Some(5));
    assert!(response.body.get("notice").is_none());

    let response = app
        .post("/cart/update", json!({"product_id": fixtures::ESP32, "quantity": 0}))
        .await;
    assert_eq!(quantity_of(&response.body, fixtures::ESP32), None);
    assert_eq!(response.body["notice"]["kind"], "removed");
    assert_eq!(line_count(&response.body), 1);

    let response = app
        .post("/cart/update", json!({"product_id": "ghost", "quantity": 4}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(line_count(&response.body), 1);
}

#[tokio::test]
async fn remove_is_idempotent() {
    let mut app = TestApp::spawn().await;
    app.add_to_cart(fixtures::ESP32, 1).await;

    let first = app
        .post("/cart/remove", json!({"product_id": fixtures::ESP32}))
        .await;
    let second = app
        .post("/cart/remove", json!({"product_id": fixtures::ESP32}))
        .await;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(line_count(&second.body), 0);
    assert_eq!(second.body["notice"]["message"], "Product removed from cart");
}

#[tokio::test]
async fn clear_empties_the_cart() {
    let mut app = TestApp::spawn().await;
    app.add_to_cart(fixtures::ESP32, 1).await;
    app.add_to_cart(fixtures::ARDUINO, 1).await;

    let response = app.post_empty("/cart/clear").await;

    assert_eq!(line_count(&response.body), 0);
    assert_eq!(response.body["notice"]["kind"], "cleared");
    assert_eq!(line_count(&app.get("/cart").await.body), 0);
}

#[tokio::test]
async fn out_of_stock_and_unknown_products_are_refused() {
    let mut app = TestApp::spawn().await;

    let response = app
        .post("/cart/add", json!({"product_id": fixtures::SOLDERING_STATION}))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["error"], "Estación de Soldadura is out of stock");

    let response = app.post("/cart/add", json!({"product_id": "nope"})).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app.post("/cart/add", json!({"product_id": "  "})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    assert_eq!(line_count(&app.get("/cart").await.body), 0);
}

#[tokio::test]
async fn free_shipping_starts_at_two_hundred() {
    let mut app = TestApp::spawn().await;

    let response = app.add_to_cart(fixtures::POWER_SUPPLY, 1).await;
    assert_eq!(response.body["shipping"], "calculated_at_next_step");
    assert_eq!(price_of(&response.body["free_shipping_threshold"]), Price::from_cents(20_000));

    let response = app.add_to_cart(fixtures::ESP32, 1).await;
    assert_eq!(response.body["shipping"], "free");
}

#[tokio::test]
async fn drawer_toggles_independently_of_items() {
    let mut app = TestApp::spawn().await;

    assert_eq!(app.post_empty("/cart/toggle").await.body["drawer_open"], true);
    assert_eq!(app.post_empty("/cart/toggle").await.body["drawer_open"], false);
    assert_eq!(app.post_empty("/cart/open").await.body["drawer_open"], true);

    let response = app.post_empty("/cart/close").await;
    assert_eq!(response.body["drawer_open"], false);
    assert_eq!(line_count(&response.body), 0);
}
