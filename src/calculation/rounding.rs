//! Currency rounding.
//!
//! Every intermediate currency value is rounded to two places immediately
//! after each arithmetic step, not only at the end.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places kept on every currency value.
pub const CURRENCY_SCALE: u32 = 2;

/// Rounds a currency value to two decimal places, halves away from zero.
///
/// # Examples
///
/// ```
/// use pay_ledger::calculation::round2;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(round2(dec!(10.005)), dec!(10.01));
/// assert_eq!(round2(dec!(-10.005)), dec!(-10.01));
/// assert_eq!(round2(dec!(3)), dec!(3.00));
/// ```
pub fn round2(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    // Pad to a fixed scale so every stored amount prints as `0.00`.
    rounded.rescale(CURRENCY_SCALE);
    rounded
}

/// Adds two currency values and rounds the result.
pub fn add2(a: Decimal, b: Decimal) -> Decimal {
    round2(a + b)
}

/// Multiplies two values and rounds the result to currency precision.
pub fn mul2(a: Decimal, b: Decimal) -> Decimal {
    round2(a * b)
}
