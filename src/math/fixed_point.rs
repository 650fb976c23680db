//! Q64.64 fixed-point primitives for square-root prices.
//!
//! Prices and liquidity live in `u128`; every product is taken in 256 bits so
//! the only way these can fail is a zero divisor.

use crate::error::MathError;
use crate::math::math_helpers::unlikely;
use crate::{Q128, U256};

/// `x * y / 2^64`, rounded down.
#[inline(always)]
pub fn mul_q64(x: u128, y: u128) -> U256 {
    (U256::from(x) * U256::from(y)) >> 64
}

/// `x * 2^64 / y`, rounded down.
#[inline(always)]
pub fn div_q64(x: u128, y: u128) -> Result<U256, MathError> {
    if unlikely(y == 0) {
        return Err(MathError::DivisionByZero);
    }
    Ok((U256::from(x) << 64) / U256::from(y))
}

/// Multiplies by a Q16.48 rate: `x * y / 2^48`, rounded down.
#[inline(always)]
pub fn mul_q48(x: u128, y: u64) -> U256 {
    (U256::from(x) * U256::from(y)) >> 48
}

/// Reciprocal of a Q64.64 value, `2^128 / x`, rounded down.
#[inline(always)]
pub fn recip_q64(x: u128) -> Result<U256, MathError> {
    if unlikely(x == 0) {
        return Err(MathError::DivisionByZero);
    }
    Ok(Q128 / U256::from(x))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: u128 = 1 << 64;

    #[test]
    fn mul_q64_identity_and_truncation() {
        assert_eq!(mul_q64(12345, ONE), U256::from(12345u64));
        // 3 * 0.5 = 1.5 -> 1
        assert_eq!(mul_q64(3, ONE / 2), U256::ONE);
        assert_eq!(
            mul_q64(u128::MAX, u128::MAX),
            (U256::from(u128::MAX) * U256::from(u128::MAX)) >> 64
        );
    }

    #[test]
    fn div_q64_scales_and_rejects_zero() {
        assert_eq!(div_q64(7, 7).unwrap(), U256::from(ONE));
        assert_eq!(div_q64(1, 2).unwrap(), U256::from(ONE / 2));
        assert!(matches!(div_q64(1, 0), Err(MathError::DivisionByZero)));
    }

    #[test]
    fn mul_q48_applies_rate() {
        let half: u64 = 1 << 47;
        assert_eq!(mul_q48(1_000, half), U256::from(500u64));
        assert_eq!(mul_q48(1_000, 1 << 48), U256::from(1_000u64));
    }

    #[test]
    fn recip_q64_of_one_is_one() {
        assert_eq!(recip_q64(ONE).unwrap(), U256::from(ONE));
        assert_eq!(recip_q64(2 * ONE).unwrap(), U256::from(ONE / 2));
        assert!(matches!(recip_q64(0), Err(MathError::DivisionByZero)));
    }
}
