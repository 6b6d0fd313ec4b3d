//! Payment details and site settings domain types.

use chrono::{DateTime, Utc};

/// Bank-transfer payment instructions shown at checkout.
///
/// Single-row entity, admin-editable.
#[derive(Debug, Clone)]
pub struct PaymentDetails {
    pub recipient: String,
    pub bank_name: String,
    pub account_number: String,
    pub instructions: String,
    pub updated_at: DateTime<Utc>,
}
