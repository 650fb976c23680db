use crate::config::{PoolSpec, FEE_BP_MULT};
use crate::error::{Error, MathError, StateError};
use crate::math::curve_math::CurveState;
use crate::math::curve_roll::RollFlow;
use crate::math::math_helpers::{to_i128_sign, to_u128};
use crate::math::tick_math::{
    get_sqrt_ratio_at_tick, MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK,
};
use crate::pool::swap::{PairFlow, SwapDirective};
use crate::U256;

/// Executes one tick-stable leg of a swap.
///
/// The leg runs until the swap quantity is used up or the curve reaches the
/// tighter of the swap's limit price and the price just short of `bump_tick`.
/// Fees are charged on the counter flow up to that limit, folded into the
/// curve as liquidity, and every flow is accumulated into `accum`.
pub fn swap_to_limit(
    curve: &mut CurveState,
    accum: &mut PairFlow,
    swap: &mut SwapDirective,
    spec: &PoolSpec,
    bump_tick: i32,
) -> Result<(), Error> {
    let limit_price = determine_limit(bump_tick, swap.limit_price, swap.is_buy)?;

    let (paid_base, paid_quote, paid_proto) =
        book_exch_fees(curve, swap.qty, spec, swap.in_base_qty, limit_price)?;
    accum.accum_swap(swap.in_base_qty, paid_base, paid_quote, paid_proto)?;

    let (paid_base, paid_quote, qty_left) = swap_over_curve(curve, swap, limit_price)?;
    accum.accum_flow(paid_base, paid_quote)?;
    swap.qty = qty_left;
    Ok(())
}

/// Tightest price the current leg may reach: one unit short of the bump
/// tick on the way up, the bump tick itself on the way down, never past the
/// swap's own limit, and inside the representable price domain.
pub fn determine_limit(bump_tick: i32, limit_price: u128, is_buy: bool) -> Result<u128, StateError> {
    let bounded = bound_limit(bump_tick, limit_price, is_buy)?;
    Ok(bounded.clamp(MIN_SQRT_RATIO, MAX_SQRT_RATIO - 1))
}

fn bound_limit(bump_tick: i32, limit_price: u128, is_buy: bool) -> Result<u128, StateError> {
    if bump_tick <= MIN_TICK || bump_tick >= MAX_TICK {
        return Ok(limit_price);
    }
    let bump_price = get_sqrt_ratio_at_tick(bump_tick)?;
    if is_buy {
        Ok((bump_price - 1).min(limit_price))
    } else {
        Ok(bump_price.max(limit_price))
    }
}

/// Splits the fee on a leg into `(liquidity_fee, protocol_fee)`. The fee
/// is charged on the counter-side flow up to `limit_price`.
pub fn calc_fee_over_swap(
    curve: &CurveState,
    swap_qty: u128,
    spec: &PoolSpec,
    in_base_qty: bool,
    limit_price: u128,
) -> Result<(u128, u128), MathError> {
    let flow = curve.calc_limit_counter(swap_qty, in_base_qty, limit_price)?;
    calc_fee_over_flow(flow, spec.fee_rate, spec.protocol_take)
}

fn calc_fee_over_flow(flow: u128, fee_rate: u16, proto_prop: u8) -> Result<(u128, u128), MathError> {
    let total_fee = to_u128(U256::from(flow) * U256::from(fee_rate) / U256::from(FEE_BP_MULT))?;
    let proto_fee = to_u128(U256::from(total_fee) * U256::from(proto_prop) >> 8)?;
    Ok((total_fee - proto_fee, proto_fee))
}

// Fees are paid on the counter side: quote when the swap is fixed in base,
// base otherwise.
fn book_exch_fees(
    curve: &mut CurveState,
    swap_qty: u128,
    spec: &PoolSpec,
    in_base_qty: bool,
    limit_price: u128,
) -> Result<(i128, i128, u128), MathError> {
    let (liq_fees, exch_fees) = calc_fee_over_swap(curve, swap_qty, spec, in_base_qty, limit_price)?;
    curve.assimilate_liq(liq_fees, in_base_qty)?;

    let total_fees = to_i128_sign(liq_fees + exch_fees, false)?;
    if in_base_qty {
        Ok((0, total_fees, exch_fees))
    } else {
        Ok((total_fees, 0, exch_fees))
    }
}

fn swap_over_curve(
    curve: &mut CurveState,
    swap: &SwapDirective,
    limit_price: u128,
) -> Result<RollFlow, Error> {
    let real_flows = curve.calc_limit_flow(swap.qty, swap.in_base_qty, limit_price)?;
    if real_flows < swap.qty {
        let rolled = curve.roll_price(limit_price, swap.in_base_qty, swap.is_buy, swap.qty)?;
        assert_price_end_stable(curve, rolled.2, limit_price)?;
        Ok(rolled)
    } else {
        Ok(curve.roll_flow(real_flows, swap.in_base_qty, swap.is_buy, swap.qty)?)
    }
}

fn assert_price_end_stable(curve: &CurveState, qty_left: u128, limit_price: u128) -> Result<(), StateError> {
    let at_limit = curve.price_root == limit_price;
    let none_left = qty_left == 0;
    if at_limit || none_left {
        Ok(())
    } else {
        Err(StateError::PriceNotStable)
    }
}
