//! Rounding policy for money amounts
//!
//! Intermediate arithmetic stays at full `BigDecimal` precision. Values are
//! rounded exactly once, when they cross into a stored or displayed record.

use bigdecimal::{BigDecimal, RoundingMode};

/// Number of fractional digits kept for stored and displayed money amounts
pub const MONEY_SCALE: i64 = 2;

/// Round a money amount to paise (2 decimals), half away from zero.
/// The scale is always 2, so a zero line prints as `0.00`.
pub fn round_money(amount: &BigDecimal) -> BigDecimal {
    amount
        .with_scale_round(MONEY_SCALE, RoundingMode::HalfUp)
        .with_scale(MONEY_SCALE)
}

/// Round to the nearest whole rupee, half away from zero, kept at money scale
/// so it prints as `100000.00`
pub fn round_whole(amount: &BigDecimal) -> BigDecimal {
    amount
        .with_scale_round(0, RoundingMode::HalfUp)
        .with_scale(MONEY_SCALE)
}
