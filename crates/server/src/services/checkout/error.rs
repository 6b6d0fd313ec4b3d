//! Checkout error types.
//!
//! Every variant carries enough context for a distinct user-facing message;
//! none of them leaves partial writes behind (the service rolls back).

use thiserror::Error;

use verdant_core::{OrderStatus, ProductId};

use crate::db::RepositoryError;
use crate::models::PromoRejection;

/// Errors that can occur during order placement and management.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// A line requested zero or a negative quantity.
    #[error("invalid quantity for product {product_id}")]
    InvalidQuantity { product_id: ProductId },

    /// The delivery amount is missing or negative.
    #[error("invalid delivery amount")]
    InvalidDeliveryAmount,

    /// A cart line references a product that does not exist.
    #[error("product {product_id} not found")]
    ProductNotFound { product_id: ProductId },

    /// The product is not currently purchasable.
    #[error("{name} is not available")]
    ProductUnavailable { name: String },

    /// Requested more units than are in stock.
    #[error("only {available} of {name} in stock (requested {requested})")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// No promo code matches the given code.
    #[error("promo code not found")]
    PromoNotFound,

    /// The promo code failed an eligibility rule.
    #[error("{0}")]
    PromoRejected(#[from] PromoRejection),

    /// The user already redeemed this promo code.
    #[error("promo code already used")]
    PromoAlreadyUsed,

    /// The order already has a promo code attached.
    #[error("order already has a promo code")]
    PromoAlreadyApplied,

    /// The user's balance does not cover the order total.
    #[error("insufficient balance")]
    InsufficientBalance,

    /// The order does not exist.
    #[error("order not found")]
    OrderNotFound,

    /// The caller does not own the order.
    #[error("not your order")]
    NotOrderOwner,

    /// The requested status change violates the transition table.
    #[error("cannot change order status from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    /// Database operation failed (transaction already rolled back).
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}
