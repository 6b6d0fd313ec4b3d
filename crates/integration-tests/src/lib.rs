//! Shared helpers for Verdant integration tests.
//!
//! The tests in `tests/` drive a running server over HTTP. Start one first:
//!
//! ```bash
//! cargo run -p verdant-cli -- migrate
//! cargo run -p verdant-server
//! ```
//!
//! Then run with `cargo test -p verdant-integration-tests -- --ignored`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use reqwest::Client;
use serde_json::{Value, json};

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("VERDANT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned())
}

/// Create an HTTP client with a cookie store (sessions are cookie-based).
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Register a fresh account and leave the client logged in as it.
///
/// Uses a unique email per call so tests do not collide.
///
/// # Panics
///
/// Panics if the request fails.
pub async fn register_user(client: &Client, tag: &str) -> Value {
    let email = format!(
        "{tag}-{}@test.example",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock before epoch")
            .as_nanos()
    );
    let resp = client
        .post(format!("{}/api/auth/register", base_url()))
        .json(&json!({
            "email": email,
            "password": "integration-test-pw",
            "name": "Integration Test",
        }))
        .send()
        .await
        .expect("Failed to register test user");

    assert!(resp.status().is_success(), "register failed: {}", resp.status());
    resp.json().await.expect("Failed to parse register response")
}
