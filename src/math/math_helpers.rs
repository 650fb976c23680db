use crate::error::MathError;
use alloy_primitives::U256;

const U256_TWO: U256 = U256::from_limbs([2, 0, 0, 0]);
const U256_THREE: U256 = U256::from_limbs([3, 0, 0, 0]);
const U128_MAX: U256 = U256::from_limbs([u64::MAX, u64::MAX, 0, 0]);

#[cold]
#[inline(never)]
fn cold_path() {}

/// Branch hint for the expected path. Routes the other arm through a
/// `#[cold]` function so the optimizer lays it out of line.
#[inline(always)]
pub(crate) fn likely(b: bool) -> bool {
    if !b {
        cold_path();
    }
    b
}

#[inline(always)]
pub(crate) fn unlikely(b: bool) -> bool {
    if b {
        cold_path();
    }
    b
}

/// Computes `a * b / denominator` with full 512‑bit intermediate precision,
/// returning a `MathError` on overflow or division by zero.
///
/// The curve math relies on this wherever a Q64.64 term is scaled by a
/// price ratio whose numerator alone could exceed 256 bits.
#[inline(always)]
pub fn mul_div(a: U256, b: U256, mut denominator: U256) -> Result<U256, MathError> {
    if unlikely(denominator.is_zero()) {
        return Err(MathError::DivisionByZero);
    }

    let mm = a.mul_mod(b, U256::MAX);
    let mut prod0 = a.wrapping_mul(b);

    let (mut prod1, borrow1) = mm.overflowing_sub(prod0);
    if borrow1 {
        prod1 = prod1.wrapping_sub(U256::ONE);
    }

    if likely(prod1.is_zero()) {
        return Ok(prod0.wrapping_div(denominator));
    }

    if unlikely(denominator <= prod1) {
        return Err(MathError::Overflow);
    }

    let remainder = a.mul_mod(b, denominator);
    let (prod0_new, borrow2) = prod0.overflowing_sub(remainder);
    prod0 = prod0_new;
    if borrow2 {
        prod1 = prod1.wrapping_sub(U256::ONE);
    }

    let twos = denominator & denominator.wrapping_neg();
    denominator = denominator.wrapping_div(twos);
    prod0 = prod0.wrapping_div(twos);

    let twos_adj = twos
        .wrapping_neg()
        .wrapping_div(twos)
        .wrapping_add(U256::ONE);
    prod0 |= prod1.wrapping_mul(twos_adj);

    let mut inv = U256_THREE.wrapping_mul(denominator) ^ U256_TWO;

    macro_rules! newton_iteration {
        () => {
            inv = inv.wrapping_mul(U256_TWO.wrapping_sub(denominator.wrapping_mul(inv)))
        };
    }

    newton_iteration!();
    newton_iteration!();
    newton_iteration!();
    newton_iteration!();
    newton_iteration!();
    newton_iteration!();

    Ok(prod0.wrapping_mul(inv))
}

/// Divides `a` by `b`, rounding up on a non‑zero remainder.
#[inline(always)]
pub fn div_rounding_up(a: U256, b: U256) -> Result<U256, MathError> {
    if unlikely(b.is_zero()) {
        return Err(MathError::DivisionByZero);
    }
    let (quotient, remainder) = a.div_rem(b);
    if remainder.is_zero() {
        Ok(quotient)
    } else {
        Ok(quotient + U256::ONE)
    }
}

/// Narrows a 256-bit intermediate to `u128`, failing on overflow.
#[inline(always)]
pub fn to_u128(x: U256) -> Result<u128, MathError> {
    if unlikely(x > U128_MAX) {
        return Err(MathError::Overflow);
    }
    let limbs = x.as_limbs();
    Ok(((limbs[1] as u128) << 64) | limbs[0] as u128)
}

/// Narrows a 256-bit intermediate to `u128`, clamping at `u128::MAX`.
#[inline(always)]
pub fn saturating_u128(x: U256) -> u128 {
    to_u128(x).unwrap_or(u128::MAX)
}

/// Converts an unsigned magnitude into a signed flow, negated when
/// `negate` is set. Magnitudes above `i128::MAX` overflow.
#[inline(always)]
pub fn to_i128_sign(magn: u128, negate: bool) -> Result<i128, MathError> {
    let signed = i128::try_from(magn).map_err(|_| MathError::Overflow)?;
    Ok(if negate { -signed } else { signed })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------- mul_div tests -------------------------

    #[test]
    fn mul_div_simple_division() {
        let result = mul_div(U256::from(10u8), U256::from(20u8), U256::from(5u8)).unwrap();
        assert_eq!(result, U256::from(40u8));
    }

    #[test]
    fn mul_div_division_by_zero() {
        let result = mul_div(U256::from(10u8), U256::from(20u8), U256::ZERO);
        assert!(matches!(result, Err(MathError::DivisionByZero)));
    }

    #[test]
    fn mul_div_wide_intermediate() {
        // (2^192 - 1) * 2^128 overflows 256 bits, the quotient by 2^128 does not.
        let a = (U256::ONE << 192) - U256::ONE;
        let b = U256::ONE << 128;
        let result = mul_div(a, b, b).unwrap();
        assert_eq!(result, a);
    }

    #[test]
    fn mul_div_full_width() {
        let result = mul_div(U256::MAX, U256::MAX, U256::MAX).unwrap();
        assert_eq!(result, U256::MAX);
    }

    #[test]
    fn mul_div_result_overflow() {
        let result = mul_div(U256::MAX, U256::from(2u8), U256::ONE);
        assert!(matches!(result, Err(MathError::Overflow)));
    }

    #[test]
    fn mul_div_rounding_down_behavior() {
        // 7 * 10 / 8 = 8.75
        let result = mul_div(U256::from(7u8), U256::from(10u8), U256::from(8u8)).unwrap();
        assert_eq!(result, U256::from(8u32));
    }

    // ------------------------- rounding up tests -------------------------

    #[test]
    fn div_rounding_up_cases() {
        assert_eq!(
            div_rounding_up(U256::from(10u8), U256::from(5u8)).unwrap(),
            U256::from(2u8)
        );
        assert_eq!(
            div_rounding_up(U256::from(10u8), U256::from(3u8)).unwrap(),
            U256::from(4u8)
        );
        assert!(matches!(
            div_rounding_up(U256::from(10u8), U256::ZERO),
            Err(MathError::DivisionByZero)
        ));
    }

    // ------------------------- narrowing tests -------------------------

    #[test]
    fn to_u128_accepts_max_and_rejects_above() {
        assert_eq!(to_u128(U256::from(u128::MAX)).unwrap(), u128::MAX);
        assert_eq!(to_u128(U256::from(12345u64)).unwrap(), 12345);
        assert!(matches!(
            to_u128(U256::from(u128::MAX) + U256::ONE),
            Err(MathError::Overflow)
        ));
        assert_eq!(saturating_u128(U256::MAX), u128::MAX);
    }

    #[test]
    fn to_i128_sign_applies_direction() {
        assert_eq!(to_i128_sign(5, false).unwrap(), 5);
        assert_eq!(to_i128_sign(5, true).unwrap(), -5);
        assert!(matches!(
            to_i128_sign(u128::MAX, false),
            Err(MathError::Overflow)
        ));
    }
}
