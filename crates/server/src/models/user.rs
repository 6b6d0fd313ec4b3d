//! User domain type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use verdant_core::{Email, UserId};

/// A shop user (domain type).
///
/// The password hash is deliberately not part of this type; it is only
/// surfaced by the repository method that verifies credentials.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address (unique, lowercase).
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Default delivery address.
    pub address: Option<String>,
    /// Whether this user may access the admin back-office.
    pub is_admin: bool,
    /// Prepaid account balance, spendable at checkout.
    pub balance: Decimal,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}
