//! Product catalog API routes.
//!
//! Public listing with filters; create/update/delete are admin-only.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use verdant_core::ProductId;

use crate::db::products::{ProductFilter, ProductInput, ProductRepository, ProductSort};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::Product;
use crate::state::AppState;

/// Client-facing product shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub images: Vec<String>,
    pub quantity: i64,
    pub category: String,
    pub is_available: bool,
    pub is_preorder: bool,
    pub is_rare: bool,
    pub is_easy_care: bool,
    pub labels: Vec<String>,
    pub delivery_cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price,
            original_price: p.original_price,
            images: p.images,
            quantity: p.quantity,
            category: p.category,
            is_available: p.is_available,
            is_preorder: p.is_preorder,
            is_rare: p.is_rare,
            is_easy_care: p.is_easy_care,
            labels: p.labels,
            delivery_cost: p.delivery_cost,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Query parameters for the catalog listing.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub category: Option<String>,
    pub available: Option<bool>,
    pub preorder: Option<bool>,
    pub rare: Option<bool>,
    pub easy_care: Option<bool>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub search: Option<String>,
    /// One of: newest, price_asc, price_desc, name.
    pub sort: Option<String>,
}

impl ListQuery {
    fn into_filter(self) -> Result<ProductFilter> {
        let sort = match self.sort.as_deref() {
            None | Some("newest") => ProductSort::Newest,
            Some("price_asc") => ProductSort::PriceAsc,
            Some("price_desc") => ProductSort::PriceDesc,
            Some("name") => ProductSort::Name,
            Some(other) => {
                return Err(AppError::BadRequest(format!("unknown sort: {other}")));
            }
        };

        Ok(ProductFilter {
            category: self.category,
            available_only: self.available.unwrap_or(false),
            preorder: self.preorder,
            rare: self.rare,
            easy_care: self.easy_care,
            min_price: self.min_price,
            max_price: self.max_price,
            search: self.search,
            sort,
        })
    }
}

/// List the catalog with optional filters.
///
/// GET /api/products
///
/// # Errors
///
/// Returns 400 for an unknown sort key.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProductResponse>>> {
    let filter = query.into_filter()?;
    let products = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

/// Get one product.
///
/// GET /api/products/{id}
///
/// # Errors
///
/// Returns 404 if the product doesn't exist.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductResponse>> {
    let product = ProductRepository::new(state.pool())
        .get(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(Json(ProductResponse::from(product)))
}

/// Request body for creating/updating a product.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    /// `null` clears the field; omitted leaves it unchanged.
    #[serde(default, deserialize_with = "crate::routes::api::double_option")]
    pub original_price: Option<Option<Decimal>>,
    pub images: Option<Vec<String>>,
    pub quantity: Option<i64>,
    pub category: Option<String>,
    pub is_available: Option<bool>,
    pub is_preorder: Option<bool>,
    pub is_rare: Option<bool>,
    pub is_easy_care: Option<bool>,
    pub labels: Option<Vec<String>>,
    pub delivery_cost: Option<Decimal>,
}

impl ProductRequest {
    fn into_input(self) -> ProductInput {
        ProductInput {
            name: self.name,
            description: self.description,
            price: self.price,
            original_price: self.original_price,
            images: self.images,
            quantity: self.quantity,
            category: self.category,
            is_available: self.is_available,
            is_preorder: self.is_preorder,
            is_rare: self.is_rare,
            is_easy_care: self.is_easy_care,
            labels: self.labels,
            delivery_cost: self.delivery_cost,
        }
    }
}

/// Create a product.
///
/// POST /api/products (admin)
///
/// # Errors
///
/// Returns 400 when name or price is missing.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(req): Json<ProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    if req.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
        return Err(AppError::validation([("name", "name is required")]));
    }
    let Some(price) = req.price else {
        return Err(AppError::validation([("price", "price is required")]));
    };
    if price < Decimal::ZERO {
        return Err(AppError::validation([("price", "price cannot be negative")]));
    }
    if req.quantity.is_some_and(|q| q < 0) {
        return Err(AppError::validation([("quantity", "quantity cannot be negative")]));
    }

    let product = ProductRepository::new(state.pool())
        .create(&req.into_input())
        .await?;

    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

/// Update a product.
///
/// PUT /api/products/{id} (admin)
///
/// # Errors
///
/// Returns 404 if the product doesn't exist.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i64>,
    Json(req): Json<ProductRequest>,
) -> Result<Json<ProductResponse>> {
    if req.price.is_some_and(|p| p < Decimal::ZERO) {
        return Err(AppError::validation([("price", "price cannot be negative")]));
    }
    if req.quantity.is_some_and(|q| q < 0) {
        return Err(AppError::validation([("quantity", "quantity cannot be negative")]));
    }

    let product = ProductRepository::new(state.pool())
        .update(ProductId::new(id), &req.into_input())
        .await?;

    Ok(Json(ProductResponse::from(product)))
}

/// Delete a product.
///
/// DELETE /api/products/{id} (admin)
///
/// # Errors
///
/// Returns 404 if the product doesn't exist.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let deleted = ProductRepository::new(state.pool())
        .delete(ProductId::new(id))
        .await?;
    if !deleted {
        return Err(AppError::NotFound(format!("product {id}")));
    }

    Ok(StatusCode::NO_CONTENT)
}
