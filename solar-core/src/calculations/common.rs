//! Rounding and ratio helpers shared by the simulation engine.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use solar_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `part / whole * 100`, or zero when `whole` is not positive.
///
/// ```
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
/// use solar_core::calculations::common::percentage_of;
///
/// assert_eq!(percentage_of(dec!(25), dec!(200)), dec!(12.5));
/// assert_eq!(percentage_of(dec!(25), Decimal::ZERO), Decimal::ZERO);
/// ```
pub fn percentage_of(
    part: Decimal,
    whole: Decimal,
) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    part / whole * Decimal::ONE_HUNDRED
}

/// Converts a fractional panel count to whole panels with the given strategy.
/// Negative counts become zero; counts past `u32::MAX` saturate.
pub fn whole_panels(
    panels: Decimal,
    strategy: RoundingStrategy,
) -> u32 {
    let rounded = panels.round_dp_with_strategy(0, strategy);
    match rounded.to_u32() {
        Some(n) => n,
        None if rounded.is_sign_negative() => 0,
        None => u32::MAX,
    }
}
