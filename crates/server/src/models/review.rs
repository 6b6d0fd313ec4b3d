//! Product review domain type.

use chrono::{DateTime, Utc};

use verdant_core::{ProductId, ReviewId, UserId};

/// A customer review, hidden from the public catalog until approved.
#[derive(Debug, Clone)]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub product_id: ProductId,
    /// Star rating, 1-5.
    pub rating: i64,
    pub body: String,
    /// Optional photo URLs.
    pub images: Vec<String>,
    /// Set by an admin; unapproved reviews are only visible in the back-office.
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}
