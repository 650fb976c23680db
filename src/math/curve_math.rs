//! Locally stable constant-product curve.
//!
//! Between two initialized ticks the pool behaves like `x * y = L^2` with
//! virtual reserves `base = L * P` and `quote = L / P`, where `P` is the
//! Q64.64 square-root price.

use crate::error::MathError;
use crate::math::compound_math::inflate_liq_seed;
use crate::math::fixed_point::{div_q64, mul_q64};
use crate::math::liquidity_math::add_liq;
use crate::math::math_helpers::{mul_div, to_u128};
use crate::U256;

/// Snapshot of the curve between two initialized ticks.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurveState {
    /// Q64.64 square-root price.
    pub price_root: u128,
    /// Ambient liquidity in seed units, inflated by `seed_deflator`.
    pub ambient_seeds: u128,
    /// Concentrated liquidity active at the current tick.
    pub conc_liq: u128,
    /// Q16.48 cumulative growth of ambient seeds.
    pub seed_deflator: u64,
    /// Q16.48 cumulative fee rewards per unit of concentrated liquidity.
    pub conc_growth: u64,
}

impl CurveState {
    pub fn new(price_root: u128, ambient_seeds: u128, conc_liq: u128) -> Self {
        Self {
            price_root,
            ambient_seeds,
            conc_liq,
            seed_deflator: 0,
            conc_growth: 0,
        }
    }

    /// Total liquidity the constant-product curve is running on.
    pub fn active_liquidity(&self) -> Result<u128, MathError> {
        let ambient = inflate_liq_seed(self.ambient_seeds, self.seed_deflator);
        add_liq(ambient, self.conc_liq)
    }

    /// Caps `swap_qty` at the flow needed to push the curve to `limit_price`,
    /// denominated in the fixed side of the swap.
    pub fn calc_limit_flow(
        &self,
        swap_qty: u128,
        in_base_qty: bool,
        limit_price: u128,
    ) -> Result<u128, MathError> {
        let limit_flow = self.calc_limit_flows(in_base_qty, limit_price)?;
        Ok(limit_flow.min(swap_qty))
    }

    fn calc_limit_flows(&self, in_base_qty: bool, limit_price: u128) -> Result<u128, MathError> {
        let liq = self.active_liquidity()?;
        if in_base_qty {
            delta_base(liq, self.price_root, limit_price)
        } else {
            delta_quote(liq, self.price_root, limit_price)
        }
    }

    /// Counter-side flow produced by moving `swap_qty` on the fixed side.
    /// The swap direction is inferred from where the limit sits.
    pub fn calc_limit_counter(
        &self,
        swap_qty: u128,
        in_base_qty: bool,
        limit_price: u128,
    ) -> Result<u128, MathError> {
        let is_buy = limit_price > self.price_root;
        let denom_flow = self.calc_limit_flow(swap_qty, in_base_qty, limit_price)?;
        invert_flow(
            self.active_liquidity()?,
            self.price_root,
            denom_flow,
            is_buy,
            in_base_qty,
        )
    }
}

/// Virtual reserve of one side at a price: `L * P` for base, `L / P` for
/// quote. Fails if the result leaves 128 bits.
pub fn reserve_at_price(liq: u128, price: u128, in_base: bool) -> Result<u128, MathError> {
    let reserve = if in_base {
        mul_q64(liq, price)
    } else {
        div_q64(liq, price)?
    };
    to_u128(reserve)
}

/// Base tokens moved when the price travels between two points, rounded down.
pub fn delta_base(liq: u128, price_x: u128, price_y: u128) -> Result<u128, MathError> {
    let price_delta = price_x.abs_diff(price_y);
    reserve_at_price(liq, price_delta, true)
}

/// Quote tokens moved when the price travels between two points, rounded
/// down. Loses at most two units against the exact value.
pub fn delta_quote(liq: u128, price: u128, limit_price: u128) -> Result<u128, MathError> {
    if limit_price > price {
        calc_quote_delta(liq, limit_price, price)
    } else {
        calc_quote_delta(liq, price, limit_price)
    }
}

// L / small - L / big, taken as (L / small) * (big - small) / big. The
// second step can exceed 256 bits before the division, hence mul_div.
fn calc_quote_delta(liq: u128, price_big: u128, price_small: u128) -> Result<u128, MathError> {
    let price_delta = price_big - price_small;
    let term_one = div_q64(liq, price_small)?;
    let term_two = mul_div(term_one, U256::from(price_delta), U256::from(price_big))?;
    to_u128(term_two)
}

/// Counter-side flow for a fixed-side flow, solved from `L^2 = X * Y`.
///
/// The denominated reserve moves by `denom_flow`, the inverse reserve is
/// recomputed from the invariant and the difference is returned. A flow
/// that would drain the denominated side entirely returns `u128::MAX`.
pub fn invert_flow(
    liq: u128,
    price: u128,
    denom_flow: u128,
    is_buy: bool,
    in_base_qty: bool,
) -> Result<u128, MathError> {
    if liq == 0 {
        return Ok(0);
    }

    let invert_reserve = reserve_at_price(liq, price, !in_base_qty)?;
    let init_reserve = reserve_at_price(liq, price, in_base_qty)?;

    let end_reserve = if is_buy == in_base_qty {
        U256::from(init_reserve) + U256::from(denom_flow)
    } else {
        U256::from(init_reserve)
            .checked_sub(U256::from(denom_flow))
            .ok_or(MathError::Underflow)?
    };
    if end_reserve.is_zero() {
        return Ok(u128::MAX);
    }

    let end_invert = U256::from(liq) * U256::from(liq) / end_reserve;
    let invert = U256::from(invert_reserve);
    let diff = if end_invert > invert {
        end_invert - invert
    } else {
        invert - end_invert
    };
    to_u128(diff)
}

/// Smallest token amount, on the given side, that is guaranteed to cover
/// one unit of price precision at this liquidity.
pub fn price_to_token_precision(liq: u128, price: u128, in_base: bool) -> Result<u128, MathError> {
    if in_base {
        Ok((liq >> 64) + 1)
    } else {
        if price <= 1 {
            return Err(MathError::DivisionByZero);
        }
        let step = div_q64(liq, price - 1)? - div_q64(liq, price)?;
        to_u128(step + U256::ONE)
    }
}
