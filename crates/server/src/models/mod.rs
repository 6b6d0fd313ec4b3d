//! Domain types for the Verdant shop.
//!
//! These types represent validated domain objects separate from database row
//! types. Repositories produce them through a single mapping function per
//! entity; route handlers convert them into client DTOs.

pub mod notification;
pub mod order;
pub mod product;
pub mod promo;
pub mod review;
pub mod settings;
pub mod user;

pub use notification::Notification;
pub use order::{Order, OrderItem};
pub use product::Product;
pub use promo::{PromoCode, PromoCodeUse, PromoRejection};
pub use review::Review;
pub use settings::PaymentDetails;
pub use user::User;

/// Session keys used by the auth middleware.
pub mod session_keys {
    /// Logged-in user id.
    pub const USER_ID: &str = "user_id";
}
