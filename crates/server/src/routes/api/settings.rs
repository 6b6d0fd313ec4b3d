//! Payment details and site settings API routes.

use std::collections::BTreeMap;

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::settings::{PaymentDetailsUpdate, SettingsRepository};
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::PaymentDetails;
use crate::state::AppState;

/// Client-facing payment details shape, shown at checkout.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetailsResponse {
    pub recipient: String,
    pub bank_name: String,
    pub account_number: String,
    pub instructions: String,
    pub updated_at: DateTime<Utc>,
}

impl From<PaymentDetails> for PaymentDetailsResponse {
    fn from(d: PaymentDetails) -> Self {
        Self {
            recipient: d.recipient,
            bank_name: d.bank_name,
            account_number: d.account_number,
            instructions: d.instructions,
            updated_at: d.updated_at,
        }
    }
}

/// Get the bank-transfer payment details.
///
/// GET /api/payment-details
///
/// # Errors
///
/// Returns 500 on persistence failures.
pub async fn get_payment_details(
    State(state): State<AppState>,
) -> Result<Json<PaymentDetailsResponse>> {
    let details = SettingsRepository::new(state.pool()).payment_details().await?;
    Ok(Json(PaymentDetailsResponse::from(details)))
}

/// Request to update payment details.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentDetailsRequest {
    pub recipient: Option<String>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub instructions: Option<String>,
}

/// Update the bank-transfer payment details.
///
/// PUT /api/payment-details (admin)
///
/// # Errors
///
/// Returns 403 for non-admins.
pub async fn update_payment_details(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(req): Json<UpdatePaymentDetailsRequest>,
) -> Result<Json<PaymentDetailsResponse>> {
    let details = SettingsRepository::new(state.pool())
        .update_payment_details(&PaymentDetailsUpdate {
            recipient: req.recipient,
            bank_name: req.bank_name,
            account_number: req.account_number,
            instructions: req.instructions,
        })
        .await?;

    Ok(Json(PaymentDetailsResponse::from(details)))
}

/// Get all site settings as a key/value map.
///
/// GET /api/settings
///
/// # Errors
///
/// Returns 500 on persistence failures.
pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, String>>> {
    let settings = SettingsRepository::new(state.pool()).all().await?;
    Ok(Json(settings))
}

/// Upsert site settings from a key/value map.
///
/// PUT /api/settings (admin)
///
/// # Errors
///
/// Returns 403 for non-admins.
pub async fn update_settings(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(req): Json<BTreeMap<String, String>>,
) -> Result<Json<BTreeMap<String, String>>> {
    let repo = SettingsRepository::new(state.pool());
    for (key, value) in &req {
        repo.set(key, value).await?;
    }

    Ok(Json(repo.all().await?))
}
