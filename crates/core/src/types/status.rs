//! Status enums for orders, payments, and promo codes.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// Transitions are restricted to the table encoded in
/// [`OrderStatus::can_transition_to`]; writing an arbitrary status string is
/// rejected at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Paid,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Whether a transition from `self` to `next` is legal.
    ///
    /// Writing the current status again is always allowed (idempotent
    /// updates); inventory side effects are gated separately by the order's
    /// `quantities_reduced` flag.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next {
            return true;
        }
        match self {
            Self::Pending => matches!(next, Self::Processing | Self::Paid | Self::Cancelled),
            Self::Processing | Self::Paid => matches!(
                next,
                Self::Processing | Self::Paid | Self::Shipped | Self::Completed | Self::Cancelled
            ),
            Self::Shipped => matches!(next, Self::Completed),
            Self::Completed | Self::Cancelled => false,
        }
    }

    /// Whether moving from `previous` into `self` should decrement inventory.
    ///
    /// Edge-triggered: entering `Paid` or `Processing` from a state that is
    /// neither. Repeated writes of the same status do not qualify.
    #[must_use]
    pub const fn triggers_inventory_decrement(self, previous: Self) -> bool {
        matches!(self, Self::Paid | Self::Processing)
            && !matches!(previous, Self::Paid | Self::Processing)
    }

    /// Whether this status has no outgoing transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "paid" => Ok(Self::Paid),
            "shipped" => Ok(Self::Shipped),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Payment status on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    PendingVerification,
    Completed,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::PendingVerification => "pending_verification",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "pending_verification" => Ok(Self::PendingVerification),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("invalid payment status: {s}")),
        }
    }
}

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Debit the user's account balance at order time.
    Balance,
    /// Manual bank transfer, verified by an uploaded payment proof.
    BankTransfer,
    /// Pay the courier on delivery.
    CashOnDelivery,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Balance => "balance",
            Self::BankTransfer => "bank_transfer",
            Self::CashOnDelivery => "cash_on_delivery",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "balance" => Ok(Self::Balance),
            "bank_transfer" => Ok(Self::BankTransfer),
            "cash_on_delivery" => Ok(Self::CashOnDelivery),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Promo code discount kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// Percentage of the item subtotal.
    Percentage,
    /// Fixed amount off the item subtotal.
    Fixed,
}

impl std::fmt::Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for DiscountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "fixed" => Ok(Self::Fixed),
            _ => Err(format!("invalid discount type: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Completed));
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for next in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Paid,
            OrderStatus::Shipped,
        ] {
            assert!(!OrderStatus::Completed.can_transition_to(next));
            assert!(!OrderStatus::Cancelled.can_transition_to(next));
        }
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_identity_transition_allowed() {
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Shipped));
    }

    #[test]
    fn test_decrement_trigger_is_edge_triggered() {
        // pending -> paid decrements
        assert!(OrderStatus::Paid.triggers_inventory_decrement(OrderStatus::Pending));
        // pending -> processing decrements
        assert!(OrderStatus::Processing.triggers_inventory_decrement(OrderStatus::Pending));
        // paid -> processing does not (already in a decremented state)
        assert!(!OrderStatus::Processing.triggers_inventory_decrement(OrderStatus::Paid));
        // paid -> paid replay does not
        assert!(!OrderStatus::Paid.triggers_inventory_decrement(OrderStatus::Paid));
        // pending -> shipped never decrements
        assert!(!OrderStatus::Shipped.triggers_inventory_decrement(OrderStatus::Pending));
    }

    #[test]
    fn test_round_trip_strings() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Paid,
            OrderStatus::Shipped,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            let s = status.to_string();
            assert_eq!(s.parse::<OrderStatus>().ok(), Some(status));
        }
        assert!("unknown".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_payment_method_round_trip() {
        for method in [
            PaymentMethod::Balance,
            PaymentMethod::BankTransfer,
            PaymentMethod::CashOnDelivery,
        ] {
            assert_eq!(method.to_string().parse::<PaymentMethod>().ok(), Some(method));
        }
    }
}
