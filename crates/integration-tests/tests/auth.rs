//! Integration tests for the auth API.
//!
//! Requires a running server; see `tests/orders.rs` for setup.

use reqwest::StatusCode;
use serde_json::{Value, json};

use verdant_integration_tests::{base_url, client, register_user};

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_register_login_me_roundtrip() {
    let client = client();
    let user = register_user(&client, "roundtrip").await;
    let email = user["email"].as_str().expect("email").to_owned();

    let resp = client
        .get(format!("{}/api/auth/me", base_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let me: Value = resp.json().await.expect("me body");
    assert_eq!(me["email"], email.as_str());

    let resp = client
        .post(format!("{}/api/auth/logout", base_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{}/api/auth/me", base_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Login again with the same credentials.
    let resp = client
        .post(format!("{}/api/auth/login", base_url()))
        .json(&json!({ "email": email, "password": "integration-test-pw" }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_wrong_password_is_unauthorized() {
    let client = client();
    let user = register_user(&client, "wrong-pw").await;
    let email = user["email"].as_str().expect("email");

    let fresh = verdant_integration_tests::client();
    let resp = fresh
        .post(format!("{}/api/auth/login", base_url()))
        .json(&json!({ "email": email, "password": "not-the-password" }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
