//! Q16.48 compounding arithmetic for growth rates, seed deflators and
//! price shifts. Every operation rounds in the direction that under-promises
//! growth to liquidity providers, so the pool stays collateralized.

use crate::error::MathError;
use crate::math::math_helpers::{saturating_u128, to_u128, unlikely};
use crate::U256;

/// 1.0 in Q16.48.
pub const ONE_Q48: u64 = 1 << 48;

const COMPOUND_DIVIDE_CEILING: U256 = U256::from_limbs([0, 0, 0, 1 << 16]);

/// Lower bound on `sqrt(1 + x) - 1` from the first two Taylor terms,
/// `x/2 - x^2/8`. Only valid for `x` in `[0, 1)`.
pub fn approx_sqrt_compound(x: u64) -> Result<u64, MathError> {
    if unlikely(x >= ONE_Q48) {
        return Err(MathError::SqrtCompoundDomain);
    }
    let linear = x >> 1;
    let quad = (((x as u128) * (x as u128)) >> 48) >> 3;
    Ok(linear - quad as u64)
}

/// Chains two growth rates: `(1 + x) * (1 + y) - 1`, saturating at `u64::MAX`.
pub fn compound_stack(x: u64, y: u64) -> u64 {
    let one = U256::from(ONE_Q48);
    let stacked: U256 = ((one + U256::from(x)) * (one + U256::from(y))) >> 48;
    let growth: U256 = stacked - one;
    if growth > U256::from(u64::MAX) {
        u64::MAX
    } else {
        growth.as_limbs()[0]
    }
}

/// Backs a deflator out of a growth value: `val / (1 + deflator)`, rounded
/// down.
pub fn compound_shrink(val: u64, deflator: u64) -> u64 {
    let shrunk = ((val as u128) << 48) / (ONE_Q48 as u128 + deflator as u128);
    u64::try_from(shrunk).unwrap_or(u64::MAX)
}

/// The growth rate implied by going from `seed` to `inflated`, capped at 1.0.
/// Requires `seed <= inflated < 2^208`.
pub fn compound_divide(inflated: U256, seed: U256) -> Result<u64, MathError> {
    if unlikely(inflated >= COMPOUND_DIVIDE_CEILING || inflated < seed) {
        return Err(MathError::CompoundDivideBounds);
    }
    if unlikely(seed.is_zero()) {
        return Err(MathError::DivisionByZero);
    }
    let ratio: U256 = (inflated << 48) / seed;
    let growth: U256 = ratio - U256::from(ONE_Q48);
    if growth > U256::from(ONE_Q48) {
        Ok(ONE_Q48)
    } else {
        Ok(growth.as_limbs()[0])
    }
}

/// Shifts a square-root price by a growth rate, up (rounded up) or down
/// (rounded down).
pub fn compound_price(price: u128, growth: u64, shift_up: bool) -> Result<u128, MathError> {
    let multiplier = U256::from(ONE_Q48 as u128 + growth as u128);
    if shift_up {
        let shifted = ((U256::from(price) * multiplier) >> 48) + U256::ONE;
        to_u128(shifted)
    } else {
        let shifted = (U256::from(price) << 48) / multiplier;
        to_u128(shifted)
    }
}

/// Converts ambient seeds into liquidity at the current deflator, rounded
/// down and saturating at `u128::MAX`.
pub fn inflate_liq_seed(seed: u128, growth: u64) -> u128 {
    let inflated = (U256::from(seed) * U256::from(ONE_Q48 as u128 + growth as u128)) >> 48;
    saturating_u128(inflated)
}

/// Converts liquidity into ambient seeds at the current deflator, rounded
/// down.
pub fn deflate_liq_seed(liq: u128, growth: u64) -> u128 {
    let deflated = (U256::from(liq) << 48) / U256::from(ONE_Q48 as u128 + growth as u128);
    saturating_u128(deflated)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HALF: u64 = ONE_Q48 / 2;
    const TENTH: u64 = ONE_Q48 / 10;

    // ------------------------- approx_sqrt_compound -------------------------

    #[test]
    fn approx_sqrt_is_a_lower_bound() {
        // sqrt(1.5) - 1 = 0.2247..; two-term Taylor gives 0.25 - 0.03125
        let approx = approx_sqrt_compound(HALF).unwrap();
        assert_eq!(approx, (HALF >> 1) - (ONE_Q48 >> 5));
        let exact = ((1.5f64).sqrt() - 1.0) * ONE_Q48 as f64;
        assert!((approx as f64) <= exact);
    }

    #[test]
    fn approx_sqrt_zero_and_domain() {
        assert_eq!(approx_sqrt_compound(0).unwrap(), 0);
        assert!(approx_sqrt_compound(ONE_Q48 - 1).is_ok());
        assert!(matches!(
            approx_sqrt_compound(ONE_Q48),
            Err(MathError::SqrtCompoundDomain)
        ));
    }

    // ------------------------- stack / shrink -------------------------

    #[test]
    fn compound_stack_identity_and_value() {
        assert_eq!(compound_stack(TENTH, 0), TENTH);
        assert_eq!(compound_stack(0, TENTH), TENTH);
        // 1.5 * 1.5 - 1 = 1.25
        assert_eq!(compound_stack(HALF, HALF), ONE_Q48 + ONE_Q48 / 4);
    }

    #[test]
    fn growth_past_one_keeps_its_integer_part() {
        // 2.0 * 2.0 - 1 = 3.0
        assert_eq!(compound_stack(ONE_Q48, ONE_Q48), 3 * ONE_Q48);
        assert_eq!(compound_stack(3 * ONE_Q48, 0), 3 * ONE_Q48);
        let seed = U256::from(1u64 << 40);
        assert_eq!(compound_divide(seed * U256::from(2u8), seed).unwrap(), ONE_Q48);
        assert_eq!(compound_divide(seed + (seed >> 2usize), seed).unwrap(), ONE_Q48 / 4);
    }

    #[test]
    fn compound_stack_saturates() {
        assert_eq!(compound_stack(u64::MAX, u64::MAX), u64::MAX);
    }

    #[test]
    fn compound_shrink_deflates() {
        assert_eq!(compound_shrink(TENTH, 0), TENTH);
        assert_eq!(compound_shrink(HALF, ONE_Q48), HALF / 2);
        assert_eq!(compound_shrink(0, TENTH), 0);
        assert!(compound_shrink(HALF, TENTH) < HALF);
        assert!(compound_shrink(HALF, TENTH) > compound_shrink(HALF, HALF));
    }

    // ------------------------- compound_divide -------------------------

    #[test]
    fn compound_divide_rates() {
        let seed = U256::from(1_000_000u64);
        assert_eq!(compound_divide(seed, seed).unwrap(), 0);
        assert_eq!(
            compound_divide(U256::from(1_500_000u64), seed).unwrap(),
            HALF
        );
        // growth beyond 100% is capped at 1.0
        assert_eq!(
            compound_divide(U256::from(5_000_000u64), seed).unwrap(),
            ONE_Q48
        );
    }

    #[test]
    fn compound_divide_preconditions() {
        assert!(matches!(
            compound_divide(U256::from(5u8), U256::from(6u8)),
            Err(MathError::CompoundDivideBounds)
        ));
        assert!(matches!(
            compound_divide(U256::ONE << 208, U256::ONE),
            Err(MathError::CompoundDivideBounds)
        ));
        assert!(compound_divide((U256::ONE << 208) - U256::ONE, U256::ONE << 200).is_ok());
    }

    // ------------------------- price / seed conversions -------------------------

    #[test]
    fn compound_price_rounds_with_direction() {
        let price = 1u128 << 64;
        let up = compound_price(price, TENTH, true).unwrap();
        let down = compound_price(price, TENTH, false).unwrap();
        assert!(up > price);
        assert!(down < price);
        assert_eq!(up, ((price * (ONE_Q48 + TENTH) as u128) >> 48) + 1);
        assert!(matches!(
            compound_price(u128::MAX, ONE_Q48, true),
            Err(MathError::Overflow)
        ));
    }

    #[test]
    fn seed_inflation_round_trip_rounds_down() {
        let growth = TENTH + 12345;
        let liq = 1_000_000_000_000u128;
        let seeds = deflate_liq_seed(liq, growth);
        let back = inflate_liq_seed(seeds, growth);
        assert!(back <= liq);
        assert!(liq - back <= 2);
        assert_eq!(inflate_liq_seed(liq, 0), liq);
        assert_eq!(inflate_liq_seed(u128::MAX, ONE_Q48), u128::MAX);
    }
}
