//! Review API routes.
//!
//! Customers submit reviews; admins moderate them. Only approved reviews are
//! publicly listed.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use verdant_core::{ProductId, ReviewId, UserId};

use crate::db::products::ProductRepository;
use crate::db::reviews::ReviewRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireUser};
use crate::models::Review;
use crate::state::AppState;

/// Client-facing review shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: ReviewId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub rating: i64,
    pub body: String,
    pub images: Vec<String>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            product_id: r.product_id,
            rating: r.rating,
            body: r.body,
            images: r.images,
            is_approved: r.is_approved,
            created_at: r.created_at,
        }
    }
}

/// Query parameters for the public review listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub product_id: i64,
}

/// List approved reviews for a product.
///
/// GET /api/reviews?productId=
///
/// # Errors
///
/// Returns 500 on persistence failures.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ReviewResponse>>> {
    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(ProductId::new(query.product_id), true)
        .await?;

    Ok(Json(reviews.into_iter().map(ReviewResponse::from).collect()))
}

/// List every review, unapproved first.
///
/// GET /api/reviews/all (admin)
///
/// # Errors
///
/// Returns 403 for non-admins.
pub async fn list_all(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<ReviewResponse>>> {
    let reviews = ReviewRepository::new(state.pool()).list_all().await?;
    Ok(Json(reviews.into_iter().map(ReviewResponse::from).collect()))
}

/// Request to submit a review.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub product_id: ProductId,
    pub rating: i64,
    pub body: Option<String>,
    pub images: Option<Vec<String>>,
}

/// Submit a review. It stays hidden until an admin approves it.
///
/// POST /api/reviews
///
/// # Errors
///
/// Returns 400 for a rating outside 1-5, 404 for an unknown product.
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>)> {
    if !(1..=5).contains(&req.rating) {
        return Err(AppError::validation([("rating", "rating must be between 1 and 5")]));
    }

    let product = ProductRepository::new(state.pool()).get(req.product_id).await?;
    if product.is_none() {
        return Err(AppError::NotFound(format!("product {}", req.product_id)));
    }

    let review = ReviewRepository::new(state.pool())
        .create(
            user.id,
            req.product_id,
            req.rating,
            req.body.as_deref().unwrap_or_default(),
            req.images.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ReviewResponse::from(review))))
}

/// Approve a review, making it publicly visible.
///
/// PUT /api/reviews/{id}/approve (admin)
///
/// # Errors
///
/// Returns 404 if the review doesn't exist.
pub async fn approve(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i64>,
) -> Result<Json<ReviewResponse>> {
    let review = ReviewRepository::new(state.pool())
        .approve(ReviewId::new(id))
        .await?;

    Ok(Json(ReviewResponse::from(review)))
}

/// Delete a review.
///
/// DELETE /api/reviews/{id} (admin)
///
/// # Errors
///
/// Returns 404 if the review doesn't exist.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let deleted = ReviewRepository::new(state.pool())
        .delete(ReviewId::new(id))
        .await?;
    if !deleted {
        return Err(AppError::NotFound(format!("review {id}")));
    }

    Ok(StatusCode::NO_CONTENT)
}
