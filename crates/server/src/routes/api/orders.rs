//! Order API routes.
//!
//! Customers place orders, list their own, apply promos, and upload payment
//! proofs; admins manage the full order book with status transitions,
//! deletion, and PDF receipts.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use verdant_core::{OrderId, OrderStatus, PaymentMethod, PaymentStatus, ProductId, UserId};

use crate::db::orders::{AdminOrderUpdate, OrderRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireUser};
use crate::models::Order;
use crate::routes::api::uploads::save_upload;
use crate::services::CheckoutService;
use crate::services::checkout::{CartLine, PlaceOrderInput};
use crate::services::receipt::ReceiptService;
use crate::state::AppState;

/// One line of an order, as sent to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: i64,
}

/// Client-facing order shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItemResponse>,
    pub items_total: Decimal,
    pub discount: Decimal,
    pub delivery_amount: Decimal,
    pub total_amount: Decimal,
    pub full_name: String,
    pub address: String,
    pub phone: String,
    pub delivery_type: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub promo_code: Option<String>,
    pub payment_proof: Option<String>,
    pub tracking_number: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            items: order
                .items
                .into_iter()
                .map(|i| OrderItemResponse {
                    product_id: i.product_id,
                    name: i.name,
                    price: i.price,
                    quantity: i.quantity,
                })
                .collect(),
            items_total: order.items_total,
            discount: order.discount,
            delivery_amount: order.delivery_amount,
            total_amount: order.total_amount,
            full_name: order.full_name,
            address: order.address,
            phone: order.phone,
            delivery_type: order.delivery_type,
            payment_method: order.payment_method,
            payment_status: order.payment_status,
            status: order.status,
            promo_code: order.promo_code,
            payment_proof: order.payment_proof,
            tracking_number: order.tracking_number,
            delivery_date: order.delivery_date,
            comment: order.comment,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// One requested cart line.
#[derive(Debug, Deserialize)]
pub struct CartLineRequest {
    pub id: ProductId,
    pub quantity: i64,
}

/// Request to place an order.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<CartLineRequest>,
    pub delivery_amount: Decimal,
    pub full_name: String,
    pub address: String,
    pub phone: String,
    pub delivery_type: String,
    pub payment_method: PaymentMethod,
    pub promo_code: Option<String>,
}

/// Place an order.
///
/// POST /api/orders
///
/// # Errors
///
/// Returns 400 for validation failures (empty cart, over-quantity lines,
/// invalid promo, insufficient balance); nothing is committed on failure.
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    let mut fields = Vec::new();
    if req.full_name.trim().is_empty() {
        fields.push(("fullName", "recipient name is required"));
    }
    if req.address.trim().is_empty() {
        fields.push(("address", "delivery address is required"));
    }
    if req.phone.trim().is_empty() {
        fields.push(("phone", "contact phone is required"));
    }
    if !fields.is_empty() {
        return Err(AppError::validation(fields));
    }

    let input = PlaceOrderInput {
        items: req
            .items
            .iter()
            .map(|line| CartLine {
                product_id: line.id,
                quantity: line.quantity,
            })
            .collect(),
        delivery_amount: req.delivery_amount,
        full_name: req.full_name.trim().to_owned(),
        address: req.address.trim().to_owned(),
        phone: req.phone.trim().to_owned(),
        delivery_type: req.delivery_type,
        payment_method: req.payment_method,
        promo_code: req.promo_code,
    };

    let order = CheckoutService::new(state.pool())
        .place_order(&user, &input)
        .await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from(order))))
}

/// List every order.
///
/// GET /api/orders (admin)
///
/// # Errors
///
/// Returns 403 for non-admins.
pub async fn list_all(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<OrderResponse>>> {
    let orders = OrderRepository::new(state.pool()).list_all().await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// List the caller's orders.
///
/// GET /api/orders/mine
///
/// # Errors
///
/// Returns 401 when not logged in.
pub async fn list_mine(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<OrderResponse>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// Get one order. Owners see their own; admins see any.
///
/// GET /api/orders/{id}
///
/// # Errors
///
/// Returns 404 for unknown orders, 403 for someone else's order.
pub async fn get(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>> {
    let order = CheckoutService::new(state.pool())
        .get_order(&user, OrderId::new(id))
        .await?;
    Ok(Json(OrderResponse::from(order)))
}

/// Request to update an order (admin).
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub comment: Option<String>,
    pub tracking_number: Option<String>,
    pub delivery_date: Option<NaiveDate>,
}

impl UpdateOrderRequest {
    fn into_update(self) -> AdminOrderUpdate {
        AdminOrderUpdate {
            status: self.status,
            payment_status: self.payment_status,
            comment: self.comment,
            tracking_number: self.tracking_number,
            delivery_date: self.delivery_date,
        }
    }
}

/// Update an order's status, comment, tracking, or delivery date.
///
/// PUT /api/orders/{id} (admin)
///
/// Entering `paid` or `processing` from any other state decrements
/// inventory exactly once; replays are accepted without re-decrementing.
///
/// # Errors
///
/// Returns 400 for transitions the status table forbids.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i64>,
    Json(req): Json<UpdateOrderRequest>,
) -> Result<Json<OrderResponse>> {
    let order = CheckoutService::new(state.pool())
        .update_order(OrderId::new(id), &req.into_update())
        .await?;
    Ok(Json(OrderResponse::from(order)))
}

/// Request for a status-only transition.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Status-only transition, same side-effect rules as the full update.
///
/// PUT /api/orders/{id}/status (admin)
///
/// # Errors
///
/// Returns 400 for transitions the status table forbids.
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>> {
    let update = AdminOrderUpdate {
        status: Some(req.status),
        ..AdminOrderUpdate::default()
    };
    let order = CheckoutService::new(state.pool())
        .update_order(OrderId::new(id), &update)
        .await?;
    Ok(Json(OrderResponse::from(order)))
}

/// Delete an order, restoring inventory and promo usage.
///
/// DELETE /api/orders/{id} (admin)
///
/// # Errors
///
/// Returns 404 for unknown orders.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    CheckoutService::new(state.pool())
        .delete_order(OrderId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Request to apply a promo code to an existing order.
#[derive(Debug, Deserialize)]
pub struct ApplyPromoRequest {
    pub code: String,
}

/// Apply a promo code to an existing order.
///
/// POST /api/orders/{id}/apply-promo
///
/// # Errors
///
/// Returns 400 when the code is invalid, already used by this user, or the
/// order already carries one.
pub async fn apply_promo(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<i64>,
    Json(req): Json<ApplyPromoRequest>,
) -> Result<Json<OrderResponse>> {
    let order = CheckoutService::new(state.pool())
        .apply_promo(&user, OrderId::new(id), &req.code)
        .await?;
    Ok(Json(OrderResponse::from(order)))
}

/// Upload a payment proof for the caller's order.
///
/// POST /api/orders/{id}/payment-proof (multipart, field `file`)
///
/// Marks the payment pending verification and decrements inventory once.
///
/// # Errors
///
/// Returns 400 when no file field is present, 403 for someone else's order.
pub async fn upload_payment_proof(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<OrderResponse>> {
    let url = save_upload(&state, multipart, "proof").await?;

    let order = CheckoutService::new(state.pool())
        .attach_payment_proof(&user, OrderId::new(id), &url)
        .await?;
    Ok(Json(OrderResponse::from(order)))
}

/// Response carrying the generated receipt URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    pub url: String,
}

/// Generate a PDF receipt for an order.
///
/// POST /api/orders/{id}/receipt (admin)
///
/// # Errors
///
/// Returns 404 for unknown orders, 500 if rendering fails.
pub async fn generate_receipt(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i64>,
) -> Result<Json<ReceiptResponse>> {
    let order = CheckoutService::new(state.pool())
        .get_order(&admin, OrderId::new(id))
        .await?;

    let config = state.config();
    let url = ReceiptService::new(&config.shop_name, &config.receipt_dir)
        .generate(&order)
        .map_err(|e| AppError::Internal(format!("receipt generation failed: {e}")))?;

    Ok(Json(ReceiptResponse { url }))
}
