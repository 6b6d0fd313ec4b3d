//! User notification domain type.

use chrono::{DateTime, Utc};

use verdant_core::{NotificationId, OrderId, UserId};

/// An in-app notification (order status change, balance top-up, ...).
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    /// The order this notification refers to, if any.
    pub order_id: Option<OrderId>,
    /// Machine-readable kind (e.g. "order_status", "balance").
    pub kind: String,
    /// Human-readable message.
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
