//! Moves the curve price along a tick-stable leg and signs the resulting
//! flows from the swapper's side: positive amounts are owed to the pool,
//! negative amounts are paid out.

use crate::error::{Error, MathError, SwapError};
use crate::math::curve_math::{delta_base, delta_quote, price_to_token_precision, CurveState};
use crate::math::fixed_point::{div_q64, recip_q64};
use crate::math::math_helpers::{div_rounding_up, saturating_u128, to_i128_sign};
use crate::math::tick_math::{MAX_SQRT_RATIO, MIN_SQRT_RATIO};
use crate::{Q128, U256};

/// Counter-side flows are padded by this many units in favour of the pool
/// to absorb the rounding loss of the delta calculations.
pub const ROUND_PRECISION_WEI: u128 = 4;

/// Signed `(base, quote, qty_left)` outcome of moving the curve.
pub type RollFlow = (i128, i128, u128);

impl CurveState {
    /// Swaps a fixed `flow` through the curve, which must stay inside the
    /// current tick. Only the counter side is rounded, the fixed side is
    /// the swapper's exact target.
    pub fn roll_flow(
        &mut self,
        flow: u128,
        in_base_qty: bool,
        is_buy: bool,
        swap_qty: u128,
    ) -> Result<RollFlow, MathError> {
        let (counter_flow, next_price) = self.derive_impact(flow, in_base_qty, is_buy)?;
        let (paid_flow, paid_counter) = sign_flow(flow, counter_flow, in_base_qty, is_buy)?;
        Ok(self.set_curve_pos(in_base_qty, is_buy, swap_qty, next_price, paid_flow, paid_counter))
    }

    /// Moves the curve to a fixed `price` and charges whatever flow that
    /// takes, rounding both sides in favour of the pool.
    pub fn roll_price(
        &mut self,
        price: u128,
        in_base_qty: bool,
        is_buy: bool,
        swap_qty: u128,
    ) -> Result<RollFlow, MathError> {
        let (flow, counter_flow) = self.derive_demand(price, in_base_qty)?;
        let (paid_flow, paid_counter) = sign_fixed(flow, counter_flow, in_base_qty, is_buy)?;
        Ok(self.set_curve_pos(in_base_qty, is_buy, swap_qty, price, paid_flow, paid_counter))
    }

    /// Nudges the price one unit past a just-crossed tick boundary so the
    /// next leg is evaluated against the new tick. The swapper pays for the
    /// extra collateral on the side the price moves into. The burn is sized
    /// as one unit of price precision in the token `swap_left` is counted in.
    ///
    /// # Errors
    ///
    /// `SwapError::ShaveBurnDown` unless `swap_left` strictly exceeds the burn.
    pub fn shave_at_bump(
        &mut self,
        in_base_qty: bool,
        is_buy: bool,
        swap_left: u128,
    ) -> Result<RollFlow, Error> {
        let burn_down =
            price_to_token_precision(self.active_liquidity()?, self.price_root, in_base_qty)?;
        if swap_left <= burn_down {
            return Err(SwapError::ShaveBurnDown.into());
        }
        if is_buy {
            Ok(self.set_shave_up(in_base_qty, burn_down)?)
        } else {
            Ok(self.set_shave_down(in_base_qty, burn_down)?)
        }
    }

    fn set_shave_up(&mut self, in_base_qty: bool, burn_down: u128) -> Result<RollFlow, MathError> {
        if self.price_root < MAX_SQRT_RATIO - 1 {
            self.price_root += 1;
        }
        let paid_base = to_i128_sign(burn_down, false)?;
        let burn_swap = if in_base_qty { burn_down } else { 0 };
        Ok((paid_base, 0, burn_swap))
    }

    fn set_shave_down(&mut self, in_base_qty: bool, burn_down: u128) -> Result<RollFlow, MathError> {
        if self.price_root > MIN_SQRT_RATIO {
            self.price_root -= 1;
        }
        let paid_quote = to_i128_sign(burn_down, false)?;
        let burn_swap = if in_base_qty { 0 } else { burn_down };
        Ok((0, paid_quote, burn_swap))
    }

    fn derive_impact(
        &self,
        flow: u128,
        in_base_qty: bool,
        is_buy: bool,
    ) -> Result<(u128, u128), MathError> {
        let liq = self.active_liquidity()?;
        let next_price = derive_flow_price(self.price_root, liq, flow, in_base_qty, is_buy)?;
        let counter_flow = if in_base_qty {
            delta_quote(liq, self.price_root, next_price)?
        } else {
            delta_base(liq, self.price_root, next_price)?
        };
        Ok((counter_flow, next_price))
    }

    fn derive_demand(&self, price: u128, in_base_qty: bool) -> Result<(u128, u128), MathError> {
        let liq = self.active_liquidity()?;
        let base_flow = delta_base(liq, self.price_root, price)?;
        let quote_flow = delta_quote(liq, self.price_root, price)?;
        Ok(if in_base_qty {
            (base_flow, quote_flow)
        } else {
            (quote_flow, base_flow)
        })
    }

    fn set_curve_pos(
        &mut self,
        in_base_qty: bool,
        is_buy: bool,
        swap_qty: u128,
        price: u128,
        paid_flow: i128,
        paid_counter: i128,
    ) -> RollFlow {
        let spent = flow_to_spent(paid_flow, in_base_qty, is_buy);
        let qty_left = swap_qty.saturating_sub(spent);
        self.price_root = price;
        if in_base_qty {
            (paid_flow, paid_counter, qty_left)
        } else {
            (paid_counter, paid_flow, qty_left)
        }
    }
}

// How much of the remaining swap quantity a signed fixed-side flow used up.
fn flow_to_spent(paid_flow: i128, in_base_qty: bool, is_buy: bool) -> u128 {
    let spent = if in_base_qty == is_buy {
        paid_flow
    } else {
        paid_flow.saturating_neg()
    };
    if spent < 0 {
        0
    } else {
        spent as u128
    }
}

// The fixed side is paid in when the swap is denominated in the token the
// swapper sells, otherwise it is paid out.
fn sign_magn(
    flow_magn: u128,
    counter_magn: u128,
    in_base_qty: bool,
    is_buy: bool,
) -> Result<(i128, i128), MathError> {
    if in_base_qty == is_buy {
        Ok((to_i128_sign(flow_magn, false)?, to_i128_sign(counter_magn, true)?))
    } else {
        Ok((to_i128_sign(flow_magn, true)?, to_i128_sign(counter_magn, false)?))
    }
}

fn sign_flow(
    flow_magn: u128,
    counter_magn: u128,
    in_base_qty: bool,
    is_buy: bool,
) -> Result<(i128, i128), MathError> {
    let (flow, counter) = sign_magn(flow_magn, counter_magn, in_base_qty, is_buy)?;
    let counter = counter
        .checked_add(ROUND_PRECISION_WEI as i128)
        .ok_or(MathError::Overflow)?;
    Ok((flow, counter))
}

fn sign_fixed(
    flow_magn: u128,
    counter_magn: u128,
    in_base_qty: bool,
    is_buy: bool,
) -> Result<(i128, i128), MathError> {
    let (flow, counter) = sign_magn(flow_magn, counter_magn, in_base_qty, is_buy)?;
    let flow = flow
        .checked_add(ROUND_PRECISION_WEI as i128)
        .ok_or(MathError::Overflow)?;
    let counter = counter
        .checked_add(ROUND_PRECISION_WEI as i128)
        .ok_or(MathError::Overflow)?;
    Ok((flow, counter))
}

/// Price reached after pushing `flow` through the curve, clamped to the
/// representable price domain.
pub fn derive_flow_price(
    price: u128,
    liq: u128,
    flow: u128,
    in_base_qty: bool,
    is_buy: bool,
) -> Result<u128, MathError> {
    if flow == 0 {
        return Ok(price);
    }
    let next_price = if in_base_qty {
        calc_base_flow_price(price, liq, flow, is_buy)?
    } else {
        calc_quote_flow_price(price, liq, flow, is_buy)?
    };
    Ok(next_price.clamp(MIN_SQRT_RATIO, MAX_SQRT_RATIO - 1))
}

// Base reserve is L * P, so the price moves linearly by flow / L. Rounding
// keeps the price short of the exact move on buys and past it on sells.
fn calc_base_flow_price(
    price: u128,
    liq: u128,
    flow: u128,
    is_buy: bool,
) -> Result<u128, MathError> {
    if liq == 0 {
        return Ok(if is_buy { u128::MAX } else { 0 });
    }
    let delta = saturating_u128(div_q64(flow, liq)?);
    if is_buy {
        Ok(price.saturating_add(delta))
    } else if delta >= price {
        Ok(0)
    } else {
        Ok(price - delta - 1)
    }
}

// Quote reserve is L / P, so the inverse price moves linearly by flow / L.
// The inverse is rounded down and the price back up, which leaves the
// virtual quote reserve under the real one.
fn calc_quote_flow_price(
    price: u128,
    liq: u128,
    flow: u128,
    is_buy: bool,
) -> Result<u128, MathError> {
    if liq == 0 {
        return Ok(if is_buy { u128::MAX } else { 0 });
    }
    let inv_price = recip_q64(price)?;
    let inv_delta = div_q64(flow, liq)?;

    let inv_limit = if is_buy {
        match inv_price.checked_sub(inv_delta + U256::ONE) {
            Some(inv) if !inv.is_zero() => inv,
            _ => return Ok(u128::MAX),
        }
    } else {
        inv_price + inv_delta
    };

    let next_price = saturating_u128(div_rounding_up(Q128, inv_limit)?);
    Ok(if is_buy {
        next_price.max(price)
    } else {
        next_price.min(price)
    })
}
