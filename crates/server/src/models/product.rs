//! Product domain type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use verdant_core::ProductId;

/// A plant (or accessory) in the catalog.
#[derive(Debug, Clone)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long description.
    pub description: String,
    /// Current selling price.
    pub price: Decimal,
    /// Pre-discount price, shown struck through when set.
    pub original_price: Option<Decimal>,
    /// Ordered list of image URLs (relative to the upload root).
    pub images: Vec<String>,
    /// Units in stock.
    pub quantity: i64,
    /// Catalog category (e.g. "succulents").
    pub category: String,
    /// Whether the product is purchasable at all.
    pub is_available: bool,
    /// Pre-order item (not yet in stock).
    pub is_preorder: bool,
    /// Rare specimen badge.
    pub is_rare: bool,
    /// Easy-care badge.
    pub is_easy_care: bool,
    /// Free-form label strings.
    pub labels: Vec<String>,
    /// Per-product delivery surcharge.
    pub delivery_cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether `requested` units can currently be sold.
    #[must_use]
    pub const fn has_stock(&self, requested: i64) -> bool {
        requested <= self.quantity
    }
}
