//! # Money Helpers
//!
//! Currency amounts are `Decimal` major units (dollars) everywhere in the
//! engine. Rounding to cents happens only on output.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// ISO 4217 code sent to the payment provider
pub const CURRENCY: &str = "usd";

/// Decimal places shown and charged for `CURRENCY`
pub const CURRENCY_DECIMALS: u32 = 2;

/// Round a major-unit amount to whole cents, half away from zero.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a major-unit amount to the provider's integer minor units.
///
/// Returns `None` if the value does not fit in an `i64`.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    let multiplier = Decimal::from(10_i64.pow(CURRENCY_DECIMALS));
    amount
        .checked_mul(multiplier)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Convert integer minor units back to a major-unit amount
pub fn from_minor_units(amount: i64) -> Decimal {
    Decimal::new(amount, CURRENCY_DECIMALS)
}

/// Format for display (e.g., "$1215.00")
pub fn format_usd(amount: Decimal) -> String {
    let rounded = round_currency(amount);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-${:.2}", rounded.abs())
    } else {
        format!("${:.2}", rounded.abs())
    }
}

/// Plain two-decimal string, the shape the provider's metadata channel gets
pub fn to_fixed(amount: Decimal) -> String {
    format!("{:.2}", round_currency(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor_units(Decimal::new(6075, 1)), Some(60750));
        assert_eq!(to_minor_units(Decimal::new(1099, 2)), Some(1099));
        // 698.625 rounds up to 69863 cents
        assert_eq!(to_minor_units(Decimal::new(698625, 3)), Some(69863));
        assert_eq!(from_minor_units(1099), Decimal::new(1099, 2));
    }

    #[test]
    fn test_round_currency() {
        assert_eq!(round_currency(Decimal::new(12345, 3)), Decimal::new(1235, 2));
        assert_eq!(round_currency(Decimal::new(139725, 2)), Decimal::new(139725, 2));
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(Decimal::new(1215, 0)), "$1215.00");
        assert_eq!(format_usd(Decimal::new(6075, 1)), "$607.50");
        assert_eq!(format_usd(Decimal::new(-5, 0)), "-$5.00");
        assert_eq!(to_fixed(Decimal::new(139725, 2)), "1397.25");
    }
}
