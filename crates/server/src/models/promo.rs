//! Promo code domain types and eligibility rules.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use verdant_core::{money, DiscountType, OrderId, PromoCodeId, PromoCodeUseId, UserId};

/// A redeemable discount code.
#[derive(Debug, Clone)]
pub struct PromoCode {
    pub id: PromoCodeId,
    /// The code itself, normalized to uppercase.
    pub code: String,
    pub discount_type: DiscountType,
    /// Percentage (0-100) or fixed amount, depending on `discount_type`.
    pub discount_value: Decimal,
    /// Minimum item subtotal required to redeem, if set.
    pub min_order_amount: Option<Decimal>,
    /// Start of the validity window.
    pub starts_at: DateTime<Utc>,
    /// End of the validity window.
    pub ends_at: DateTime<Utc>,
    /// Redemption cap, if set. Invariant: `current_uses <= max_uses`.
    pub max_uses: Option<i64>,
    pub current_uses: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Why a promo code was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PromoRejection {
    #[error("this promo code is not active")]
    Inactive,
    #[error("this promo code is not valid yet")]
    NotStarted,
    #[error("this promo code has expired")]
    Expired,
    #[error("this promo code has reached its usage limit")]
    Exhausted,
    #[error("the order does not reach the minimum amount for this promo code")]
    BelowMinimum,
}

impl PromoCode {
    /// Check every eligibility rule except per-user reuse (which needs a
    /// database lookup and is enforced by the checkout service).
    ///
    /// # Errors
    ///
    /// Returns the first failing [`PromoRejection`].
    pub fn check_eligibility(
        &self,
        items_total: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), PromoRejection> {
        if !self.is_active {
            return Err(PromoRejection::Inactive);
        }
        if now < self.starts_at {
            return Err(PromoRejection::NotStarted);
        }
        if now > self.ends_at {
            return Err(PromoRejection::Expired);
        }
        if let Some(max) = self.max_uses
            && self.current_uses >= max
        {
            return Err(PromoRejection::Exhausted);
        }
        if let Some(min) = self.min_order_amount
            && items_total < min
        {
            return Err(PromoRejection::BelowMinimum);
        }
        Ok(())
    }

    /// Compute the discount this code grants against an item subtotal.
    ///
    /// Percentage codes apply to the item subtotal only, never to delivery;
    /// fixed codes are clamped so the discount never exceeds the subtotal
    /// and is never negative.
    #[must_use]
    pub fn compute_discount(&self, items_total: Decimal) -> Decimal {
        let raw = match self.discount_type {
            DiscountType::Percentage => money::percentage_of(items_total, self.discount_value),
            DiscountType::Fixed => self.discount_value,
        };
        money::clamp_discount(raw, items_total)
    }
}

/// A recorded redemption: one row per (promo, user).
#[derive(Debug, Clone)]
pub struct PromoCodeUse {
    pub id: PromoCodeUseId,
    pub promo_code_id: PromoCodeId,
    pub user_id: UserId,
    pub order_id: OrderId,
    pub discount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::dec;

    fn sample(discount_type: DiscountType, value: Decimal) -> PromoCode {
        PromoCode {
            id: PromoCodeId::new(1),
            code: "SPRING10".to_owned(),
            discount_type,
            discount_value: value,
            min_order_amount: None,
            starts_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap(),
            max_uses: Some(100),
            current_uses: 0,
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn mid_2025() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_eligible_code_passes() {
        let promo = sample(DiscountType::Percentage, dec!(10));
        assert_eq!(promo.check_eligibility(dec!(1000), mid_2025()), Ok(()));
    }

    #[test]
    fn test_inactive_rejected() {
        let mut promo = sample(DiscountType::Percentage, dec!(10));
        promo.is_active = false;
        assert_eq!(
            promo.check_eligibility(dec!(1000), mid_2025()),
            Err(PromoRejection::Inactive)
        );
    }

    #[test]
    fn test_window_enforced() {
        let promo = sample(DiscountType::Percentage, dec!(10));
        let before = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            promo.check_eligibility(dec!(1000), before),
            Err(PromoRejection::NotStarted)
        );
        assert_eq!(
            promo.check_eligibility(dec!(1000), after),
            Err(PromoRejection::Expired)
        );
    }

    #[test]
    fn test_cap_enforced() {
        let mut promo = sample(DiscountType::Percentage, dec!(10));
        promo.current_uses = 100;
        assert_eq!(
            promo.check_eligibility(dec!(1000), mid_2025()),
            Err(PromoRejection::Exhausted)
        );
    }

    #[test]
    fn test_minimum_enforced() {
        let mut promo = sample(DiscountType::Percentage, dec!(10));
        promo.min_order_amount = Some(dec!(500));
        assert_eq!(
            promo.check_eligibility(dec!(499.99), mid_2025()),
            Err(PromoRejection::BelowMinimum)
        );
        assert_eq!(promo.check_eligibility(dec!(500), mid_2025()), Ok(()));
    }

    #[test]
    fn test_percentage_discount_on_subtotal() {
        let promo = sample(DiscountType::Percentage, dec!(10));
        // Items 1000, delivery 200: discount is 100, never 120.
        assert_eq!(promo.compute_discount(dec!(1000)), dec!(100));
    }

    #[test]
    fn test_fixed_discount_clamped_to_subtotal() {
        let promo = sample(DiscountType::Fixed, dec!(1500));
        assert_eq!(promo.compute_discount(dec!(1000)), dec!(1000));
    }

    #[test]
    fn test_negative_value_clamped_to_zero() {
        let promo = sample(DiscountType::Fixed, dec!(-50));
        assert_eq!(promo.compute_discount(dec!(1000)), Decimal::ZERO);
    }
}
