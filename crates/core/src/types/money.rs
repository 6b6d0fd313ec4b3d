//! Decimal money handling at the storage boundary.
//!
//! SQLite has no decimal column type, so monetary amounts are stored as
//! `TEXT` and converted to [`rust_decimal::Decimal`] exactly once, at the
//! row-to-domain mapping. These helpers are that single conversion point.

use rust_decimal::Decimal;

/// Errors converting stored amounts to [`Decimal`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum MoneyError {
    /// The stored text is not a valid decimal number.
    #[error("invalid monetary amount in database: {0:?}")]
    Invalid(String),
}

/// Parse a monetary amount from its stored `TEXT` form.
///
/// # Errors
///
/// Returns [`MoneyError::Invalid`] if the text is not a decimal number.
pub fn parse_db(s: &str) -> Result<Decimal, MoneyError> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|_| MoneyError::Invalid(s.to_owned()))
}

/// Format a monetary amount for storage.
///
/// Amounts are normalized (no trailing zeros beyond two decimal places) so
/// that equal values always store equal text.
#[must_use]
pub fn to_db(amount: Decimal) -> String {
    amount.round_dp(2).normalize().to_string()
}

/// Compute `pct` percent of `subtotal`, rounded to two decimal places.
#[must_use]
pub fn percentage_of(subtotal: Decimal, pct: Decimal) -> Decimal {
    (subtotal * pct / Decimal::ONE_HUNDRED).round_dp(2)
}

/// Clamp a discount into `[0, items_total]`.
///
/// A discount can never exceed the item subtotal (fixed codes larger than
/// the cart) and can never be negative.
#[must_use]
pub fn clamp_discount(discount: Decimal, items_total: Decimal) -> Decimal {
    discount.max(Decimal::ZERO).min(items_total)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn test_parse_db_valid() {
        assert_eq!(parse_db("19.99").unwrap(), dec!(19.99));
        assert_eq!(parse_db(" 1300 ").unwrap(), dec!(1300));
        assert_eq!(parse_db("0").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_db_invalid() {
        assert!(matches!(parse_db("abc"), Err(MoneyError::Invalid(_))));
        assert!(matches!(parse_db(""), Err(MoneyError::Invalid(_))));
    }

    #[test]
    fn test_to_db_normalizes() {
        assert_eq!(to_db(dec!(10.00)), "10");
        assert_eq!(to_db(dec!(10.50)), "10.5");
        assert_eq!(to_db(dec!(10.505)), "10.5");
        assert_eq!(to_db(dec!(10.515)), "10.52");
    }

    #[test]
    fn test_percentage_of() {
        assert_eq!(percentage_of(dec!(1000), dec!(10)), dec!(100));
        assert_eq!(percentage_of(dec!(333), dec!(15)), dec!(49.95));
    }

    #[test]
    fn test_clamp_discount() {
        assert_eq!(clamp_discount(dec!(100), dec!(1000)), dec!(100));
        assert_eq!(clamp_discount(dec!(1500), dec!(1000)), dec!(1000));
        assert_eq!(clamp_discount(dec!(-5), dec!(1000)), Decimal::ZERO);
    }
}
