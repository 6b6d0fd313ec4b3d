//! Review repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use verdant_core::{ProductId, ReviewId, UserId};

use super::RepositoryError;
use crate::models::Review;

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    user_id: i64,
    product_id: i64,
    rating: i64,
    body: String,
    images: String,
    is_approved: bool,
    created_at: DateTime<Utc>,
}

const REVIEW_COLUMNS: &str =
    "id, user_id, product_id, rating, body, images, is_approved, created_at";

impl ReviewRow {
    /// The single row-to-domain mapping for reviews.
    fn into_domain(self) -> Result<Review, RepositoryError> {
        let images: Vec<String> =
            serde_json::from_str(&self.images).map_err(RepositoryError::corrupt)?;

        Ok(Review {
            id: ReviewId::new(self.id),
            user_id: UserId::new(self.user_id),
            product_id: ProductId::new(self.product_id),
            rating: self.rating,
            body: self.body,
            images,
            is_approved: self.is_approved,
            created_at: self.created_at,
        })
    }
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List reviews for a product. Public callers only see approved ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
        approved_only: bool,
    ) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews \
             WHERE product_id = ?1 AND (is_approved = 1 OR ?2 = 0) \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(product_id)
        .bind(approved_only)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ReviewRow::into_domain).collect()
    }

    /// List every review (admin moderation queue), unapproved first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews ORDER BY is_approved ASC, created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ReviewRow::into_domain).collect()
    }

    /// Create a review (unapproved until moderated).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails (including
    /// rating check violations).
    pub async fn create(
        &self,
        user_id: UserId,
        product_id: ProductId,
        rating: i64,
        body: &str,
        images: &[String],
    ) -> Result<Review, RepositoryError> {
        let images_json = serde_json::to_string(images).map_err(RepositoryError::corrupt)?;

        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "INSERT INTO reviews (user_id, product_id, rating, body, images, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(user_id)
        .bind(product_id)
        .bind(rating)
        .bind(body)
        .bind(images_json)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        row.into_domain()
    }

    /// Approve a review, making it publicly visible.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    pub async fn approve(&self, id: ReviewId) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "UPDATE reviews SET is_approved = 1 WHERE id = ?1 RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.into_domain()
    }

    /// Delete a review.
    ///
    /// # Returns
    ///
    /// Returns `true` if the review was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ReviewId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
