//! Integer percentage arithmetic
//!
//! All fee and split calculations use integer multiply-then-divide with
//! rounding toward zero. The simulator and the authoritative executor share
//! these helpers, which is what keeps their reports bit-identical. Floating
//! point is banned from this crate tree.

use alloy_primitives::{U256, U512};

/// Percentage basis for order fees: 1000 == 100.0%.
pub const FEE_PERCENTAGE_BASE: u16 = 1000;

/// Percentage basis for wallet fee splits: 100 == 100%.
pub const WALLET_SPLIT_BASE: u16 = 100;

/// `amount * numerator / base`, rounding toward zero.
///
/// Requires `numerator <= base`; callers validate percentages before
/// settlement. Decomposing as `(amount / base) * numerator + (amount % base)
/// * numerator / base` keeps every intermediate inside 256 bits for any
/// `amount`, and is exactly equal to the widened product floor-divided.
pub fn proportion(amount: U256, numerator: u16, base: u16) -> U256 {
    debug_assert!(numerator <= base, "percentage above base");
    if numerator == 0 || amount.is_zero() {
        return U256::ZERO;
    }
    let num = U256::from(numerator);
    let base = U256::from(base);
    (amount / base) * num + (amount % base) * num / base
}

/// `amount * numerator / denominator` for full-width operands, rounding
/// toward zero. Used for ring fill scaling (`fill_s * amount_b / amount_s`).
///
/// Widens through 512 bits so the product cannot overflow. Requires
/// `amount <= denominator` (fills are capped at the order's maximum), which
/// bounds the result by `numerator` and keeps it inside 256 bits.
pub fn mul_div_floor(amount: U256, numerator: U256, denominator: U256) -> U256 {
    debug_assert!(!denominator.is_zero(), "division by zero");
    debug_assert!(amount <= denominator, "fill exceeds order maximum");
    if amount.is_zero() || numerator.is_zero() {
        return U256::ZERO;
    }
    let wide = amount.to::<U512>() * numerator.to::<U512>() / denominator.to::<U512>();
    wide.to::<U256>()
}
