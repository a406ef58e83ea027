//! Rounding and clamping helpers shared by the calculators.
//!
//! Monetary figures are rounded to cents only where a value crosses a
//! boundary: a currency conversion, a division, or a report field. Sums are
//! never rounded mid-way.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to two decimal places, midpoints away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use irpf_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(1704.994)), dec!(1704.99));
/// assert_eq!(round_half_up(dec!(1704.995)), dec!(1705.00));
/// assert_eq!(round_half_up(dec!(-8.125)), dec!(-8.13));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamps negative values to zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use irpf_core::calculations::common::floor_at_zero;
///
/// assert_eq!(floor_at_zero(dec!(-0.01)), dec!(0));
/// assert_eq!(floor_at_zero(dec!(12.30)), dec!(12.30));
/// ```
pub fn floor_at_zero(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Divides by 12 and rounds to cents.
pub fn per_month(annual: Decimal) -> Decimal {
    round_half_up(annual / Decimal::from(12))
}
