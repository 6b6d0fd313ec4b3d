//! Order domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use verdant_core::{OrderId, OrderStatus, PaymentMethod, PaymentStatus, ProductId, UserId};

/// A single line of an order.
///
/// Name and unit price are captured at order time so later product edits do
/// not rewrite history. This type is what the `orders.items` JSON column
/// serializes; it never travels as raw text inside the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: i64,
}

impl OrderItem {
    /// Line subtotal (`price * quantity`).
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A persisted order.
///
/// Invariant, established at creation time:
/// `total_amount = items_total - discount + delivery_amount`,
/// with `discount` clamped to `[0, items_total]`.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    /// Owner of the order.
    pub user_id: UserId,
    /// Frozen line-item snapshot.
    pub items: Vec<OrderItem>,
    /// Sum of line subtotals before discount and delivery.
    pub items_total: Decimal,
    /// Promo discount applied against `items_total`.
    pub discount: Decimal,
    /// Delivery fee, never discounted.
    pub delivery_amount: Decimal,
    /// Grand total charged to the customer.
    pub total_amount: Decimal,
    /// Recipient name.
    pub full_name: String,
    /// Delivery address.
    pub address: String,
    /// Contact phone.
    pub phone: String,
    /// Courier / pickup selection.
    pub delivery_type: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    /// Promo code applied to this order, if any.
    pub promo_code: Option<String>,
    /// Relative URL of the uploaded payment proof, if any.
    pub payment_proof: Option<String>,
    /// Carrier tracking number, set by admins.
    pub tracking_number: Option<String>,
    /// Expected delivery date, set by admins.
    pub delivery_date: Option<NaiveDate>,
    /// Admin comment.
    pub comment: Option<String>,
    /// Idempotency guard: stock has been decremented for this order.
    /// Set at most once; gates every future decrement attempt.
    pub quantities_reduced: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn test_item_subtotal() {
        let item = OrderItem {
            product_id: ProductId::new(1),
            name: "Monstera deliciosa".to_owned(),
            price: dec!(500),
            quantity: 2,
        };
        assert_eq!(item.subtotal(), dec!(1000));
    }

    #[test]
    fn test_items_serialize_as_json_array() {
        let items = vec![OrderItem {
            product_id: ProductId::new(3),
            name: "Ficus lyrata".to_owned(),
            price: dec!(19.99),
            quantity: 1,
        }];
        let json = serde_json::to_string(&items).unwrap();
        let back: Vec<OrderItem> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, items);
    }
}
