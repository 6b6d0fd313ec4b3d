//! Integration tests for the order API.
//!
//! These tests require a running server with a migrated database:
//!
//! ```bash
//! cargo run -p verdant-cli -- migrate
//! cargo run -p verdant-server
//! ```
//!
//! Run with: cargo test -p verdant-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::{Value, json};

use verdant_integration_tests::{base_url, client, register_user};

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_create_order_requires_login() {
    let client = client();

    let resp = client
        .post(format!("{}/api/orders", base_url()))
        .json(&json!({
            "items": [{"id": 1, "quantity": 1}],
            "deliveryAmount": "0",
            "fullName": "Nobody",
            "address": "Nowhere",
            "phone": "+0",
            "deliveryType": "courier",
            "paymentMethod": "cash_on_delivery",
        }))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_empty_cart_is_rejected() {
    let client = client();
    register_user(&client, "empty-cart").await;

    let resp = client
        .post(format!("{}/api/orders", base_url()))
        .json(&json!({
            "items": [],
            "deliveryAmount": "0",
            "fullName": "Empty Cart",
            "address": "1 Test Lane",
            "phone": "+1",
            "deliveryType": "courier",
            "paymentMethod": "cash_on_delivery",
        }))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("body");
    assert!(body["message"].as_str().is_some());
}

#[tokio::test]
#[ignore = "Requires running server and a seeded catalog"]
async fn test_place_order_and_list_mine() {
    let client = client();
    register_user(&client, "place-order").await;

    // Assumes product 1 exists with stock (cargo run -p verdant-cli -- seed).
    let resp = client
        .post(format!("{}/api/orders", base_url()))
        .json(&json!({
            "items": [{"id": 1, "quantity": 1}],
            "deliveryAmount": "300",
            "fullName": "Fern Fan",
            "address": "1 Greenhouse Lane",
            "phone": "+1000000",
            "deliveryType": "courier",
            "paymentMethod": "cash_on_delivery",
        }))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.expect("order body");
    assert_eq!(order["status"], "pending");

    let resp = client
        .get(format!("{}/api/orders/mine", base_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let orders: Vec<Value> = resp.json().await.expect("orders body");
    assert_eq!(orders.len(), 1);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_admin_endpoints_are_forbidden_for_customers() {
    let client = client();
    register_user(&client, "not-admin").await;

    let resp = client
        .get(format!("{}/api/orders", base_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = client
        .get(format!("{}/api/export/orders", base_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
