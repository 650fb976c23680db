//! Folds swap fees back into the curve as ambient liquidity.
//!
//! Fees are collected on the counter side of the swap. They grow the virtual
//! reserve on that side, which grows liquidity by the square root of the
//! reserve growth. Every step rounds down so liquidity never outruns the
//! collateral actually held.

use crate::error::MathError;
use crate::math::compound_math::{
    approx_sqrt_compound, compound_divide, compound_price, compound_shrink, compound_stack,
    ONE_Q48,
};
use crate::math::curve_math::{price_to_token_precision, reserve_at_price, CurveState};
use crate::math::fixed_point::mul_q48;
use crate::math::liquidity_math::add_liq;
use crate::math::math_helpers::to_u128;
use crate::U256;

/// Upper bound on how far one assimilation may expand liquidity.
const MAX_LIQ_EXPANSION: u128 = 2;

impl CurveState {
    /// Converts `fees_paid` into ambient liquidity, shifting the price in the
    /// direction of the fee token. A curve without liquidity is left alone.
    pub fn assimilate_liq(&mut self, fees_paid: u128, is_swap_in_base: bool) -> Result<(), MathError> {
        let liq = self.active_liquidity()?;
        if liq == 0 {
            return Ok(());
        }

        let fees_in_base = !is_swap_in_base;
        let fees_to_liq = shave_for_precision(liq, self.price_root, fees_paid, fees_in_base)?;
        let inflator = calc_liq_inflator(liq, self.price_root, fees_to_liq, fees_in_base)?;
        if inflator > 0 {
            self.step_to_liquidity(inflator, fees_in_base)?;
        }
        Ok(())
    }

    fn step_to_liquidity(&mut self, inflator: u64, fees_in_base: bool) -> Result<(), MathError> {
        self.price_root = compound_price(self.price_root, inflator, fees_in_base)?;
        self.seed_deflator = compound_stack(self.seed_deflator, inflator);

        // Concentrated rewards are paid out as ambient seeds, so the inflator
        // is deflated by the post-trade seed growth before being applied.
        let conc_rewards = compound_shrink(inflator, self.seed_deflator);
        let new_ambient_seeds = to_u128(mul_q48(self.conc_liq, conc_rewards))?;

        self.conc_growth = self
            .conc_growth
            .checked_add(round_down_conc_rewards(conc_rewards, new_ambient_seeds))
            .ok_or(MathError::Overflow)?;
        self.ambient_seeds = add_liq(self.ambient_seeds, new_ambient_seeds)?;
        Ok(())
    }
}

/// Fees left after holding back a precision buffer of twice the token
/// precision unit.
pub fn shave_for_precision(
    liq: u128,
    price: u128,
    fees_paid: u128,
    fees_in_base: bool,
) -> Result<u128, MathError> {
    let buffer_tokens = MAX_LIQ_EXPANSION
        .saturating_mul(price_to_token_precision(liq, price, fees_in_base)?);
    Ok(fees_paid.saturating_sub(buffer_tokens))
}

/// Liquidity growth rate (Q16.48) implied by adding `fees_paid` to the
/// virtual reserve on the fee side.
pub fn calc_liq_inflator(
    liq: u128,
    price: u128,
    fees_paid: u128,
    fees_in_base: bool,
) -> Result<u64, MathError> {
    let reserve = reserve_at_price(liq, price, fees_in_base)?;
    calc_reserve_inflator(reserve, fees_paid)
}

/// # Errors
///
/// `MathError::InflatorOverflow` if liquidity would grow by 100% or more.
pub fn calc_reserve_inflator(reserve: u128, fees_paid: u128) -> Result<u64, MathError> {
    if reserve == 0 || fees_paid > reserve {
        return Ok(0);
    }

    let next_reserve = U256::from(reserve) + U256::from(fees_paid);
    let inflator_root = compound_divide(next_reserve, U256::from(reserve))?;
    let inflator = approx_sqrt_compound(inflator_root)?;

    if inflator >= ONE_Q48 {
        return Err(MathError::InflatorOverflow);
    }
    Ok(inflator)
}

// Shrinks the reward rate by the rounding share of the seed injection,
// `R * A / (A + 1)`, so rewards never exceed the seeds backing them.
fn round_down_conc_rewards(conc_inflator: u64, new_ambient_seeds: u128) -> u64 {
    if new_ambient_seeds == 0 {
        return 0;
    }
    let seeds = U256::from(new_ambient_seeds);
    let shrunk = U256::from(conc_inflator) * seeds / (seeds + U256::ONE);
    shrunk.as_limbs()[0]
}
