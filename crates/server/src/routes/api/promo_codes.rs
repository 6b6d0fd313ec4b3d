//! Promo code API routes.
//!
//! Public validation (discount preview) plus admin CRUD.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use verdant_core::{DiscountType, PromoCodeId};

use crate::db::promo_codes::{PromoCodeInput, PromoCodeRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireUser};
use crate::models::PromoCode;
use crate::services::CheckoutService;
use crate::state::AppState;

/// Client-facing promo code shape (admin views).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCodeResponse {
    pub id: PromoCodeId,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_order_amount: Option<Decimal>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub max_uses: Option<i64>,
    pub current_uses: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<PromoCode> for PromoCodeResponse {
    fn from(p: PromoCode) -> Self {
        Self {
            id: p.id,
            code: p.code,
            discount_type: p.discount_type,
            discount_value: p.discount_value,
            min_order_amount: p.min_order_amount,
            starts_at: p.starts_at,
            ends_at: p.ends_at,
            max_uses: p.max_uses,
            current_uses: p.current_uses,
            is_active: p.is_active,
            created_at: p.created_at,
        }
    }
}

/// Request to preview a promo against a cart total.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub code: String,
    pub cart_total: Decimal,
}

/// Discount preview returned by validation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount: Decimal,
    pub total_after_discount: Decimal,
}

/// Validate a promo code against a cart total.
///
/// POST /api/promo-codes/validate
///
/// Enforces the full rule set, including single-use-per-user.
///
/// # Errors
///
/// Returns 400 with a distinct message per rejection reason.
pub async fn validate(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(req): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>> {
    let (promo, discount) = CheckoutService::new(state.pool())
        .preview_promo(&user, &req.code, req.cart_total)
        .await?;

    Ok(Json(ValidateResponse {
        code: promo.code,
        discount_type: promo.discount_type,
        discount,
        total_after_discount: req.cart_total - discount,
    }))
}

/// List all promo codes.
///
/// GET /api/promo-codes (admin)
///
/// # Errors
///
/// Returns 403 for non-admins.
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<PromoCodeResponse>>> {
    let codes = PromoCodeRepository::new(state.pool()).list().await?;
    Ok(Json(codes.into_iter().map(PromoCodeResponse::from).collect()))
}

/// Get one promo code.
///
/// GET /api/promo-codes/{id} (admin)
///
/// # Errors
///
/// Returns 404 if the code doesn't exist.
pub async fn get(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i64>,
) -> Result<Json<PromoCodeResponse>> {
    let promo = PromoCodeRepository::new(state.pool())
        .get(PromoCodeId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("promo code {id}")))?;

    Ok(Json(PromoCodeResponse::from(promo)))
}

/// Request body for creating/updating a promo code.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PromoCodeRequest {
    pub code: Option<String>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<Decimal>,
    /// `null` clears the field; omitted leaves it unchanged.
    #[serde(default, deserialize_with = "crate::routes::api::double_option")]
    pub min_order_amount: Option<Option<Decimal>>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    /// `null` clears the cap; omitted leaves it unchanged.
    #[serde(default, deserialize_with = "crate::routes::api::double_option")]
    pub max_uses: Option<Option<i64>>,
    pub is_active: Option<bool>,
}

impl PromoCodeRequest {
    fn validate_values(&self) -> Result<()> {
        if let (Some(DiscountType::Percentage), Some(value)) =
            (self.discount_type, self.discount_value)
            && !(Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(&value)
        {
            return Err(AppError::validation([(
                "discountValue",
                "percentage must be between 0 and 100",
            )]));
        }
        if let Some(value) = self.discount_value
            && value < Decimal::ZERO
        {
            return Err(AppError::validation([(
                "discountValue",
                "discount cannot be negative",
            )]));
        }
        if let (Some(starts), Some(ends)) = (self.starts_at, self.ends_at)
            && ends < starts
        {
            return Err(AppError::validation([(
                "endsAt",
                "end date must be after start date",
            )]));
        }
        Ok(())
    }

    fn into_input(self) -> PromoCodeInput {
        PromoCodeInput {
            code: self.code,
            discount_type: self.discount_type,
            discount_value: self.discount_value,
            min_order_amount: self.min_order_amount,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            max_uses: self.max_uses,
            is_active: self.is_active,
        }
    }
}

/// Create a promo code.
///
/// POST /api/promo-codes (admin)
///
/// # Errors
///
/// Returns 400 for missing/invalid fields, 409 for a duplicate code.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(req): Json<PromoCodeRequest>,
) -> Result<(StatusCode, Json<PromoCodeResponse>)> {
    if req.code.as_deref().is_none_or(|c| c.trim().is_empty()) {
        return Err(AppError::validation([("code", "code is required")]));
    }
    if req.discount_type.is_none() {
        return Err(AppError::validation([("discountType", "discount type is required")]));
    }
    if req.discount_value.is_none() {
        return Err(AppError::validation([("discountValue", "discount value is required")]));
    }
    if req.starts_at.is_none() || req.ends_at.is_none() {
        return Err(AppError::validation([("startsAt", "validity window is required")]));
    }
    req.validate_values()?;

    let promo = PromoCodeRepository::new(state.pool())
        .create(&req.into_input())
        .await?;

    Ok((StatusCode::CREATED, Json(PromoCodeResponse::from(promo))))
}

/// Update a promo code.
///
/// PUT /api/promo-codes/{id} (admin)
///
/// # Errors
///
/// Returns 404 if the code doesn't exist.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i64>,
    Json(req): Json<PromoCodeRequest>,
) -> Result<Json<PromoCodeResponse>> {
    req.validate_values()?;

    let promo = PromoCodeRepository::new(state.pool())
        .update(PromoCodeId::new(id), &req.into_input())
        .await?;

    Ok(Json(PromoCodeResponse::from(promo)))
}

/// Delete a promo code.
///
/// DELETE /api/promo-codes/{id} (admin)
///
/// # Errors
///
/// Returns 404 if the code doesn't exist.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let deleted = PromoCodeRepository::new(state.pool())
        .delete(PromoCodeId::new(id))
        .await?;
    if !deleted {
        return Err(AppError::NotFound(format!("promo code {id}")));
    }

    Ok(StatusCode::NO_CONTENT)
}
