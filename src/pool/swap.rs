use crate::config::PoolSpec;
use crate::error::{Error, MathError, SwapError};
use crate::math::curve_math::CurveState;
use crate::math::liquidity_math::add_delta;
use crate::math::math_helpers::unlikely;
use crate::math::swap_math::swap_to_limit;
use crate::math::tick_bitmap::is_tick_finite;
use crate::math::tick_math::get_tick_at_sqrt_ratio;
use crate::pool::ambient_pool::PoolId;
use crate::pool::knockout::cross_knockout;
use crate::pool::level_book::cross_level;
use crate::pool::store::LevelStore;
use crate::pool::tick_census::{pin_bitmap, seek_mezz_spill};
use tracing::{debug, trace};

/// What is left of a swap while it sweeps through the curve.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SwapDirective {
    /// `true` when the swapper pays base and receives quote.
    pub is_buy: bool,
    /// Whether `qty` is denominated in the base token.
    pub in_base_qty: bool,
    /// Remaining quantity on the fixed side.
    pub qty: u128,
    /// Q64.64 square-root price the swap may not move past.
    pub limit_price: u128,
    /// Kept for parity with on-chain directives; only the plain roll is
    /// simulated.
    pub roll_type: u8,
}

impl SwapDirective {
    #[inline]
    pub fn new(is_buy: bool, in_base_qty: bool, qty: u128, limit_price: u128) -> Self {
        Self {
            is_buy,
            in_base_qty,
            qty,
            limit_price,
            roll_type: 0,
        }
    }
}

/// Running token flows of a swap. Positive amounts are owed to the pool,
/// negative amounts are paid out to the swapper.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PairFlow {
    pub base_flow: i128,
    pub quote_flow: i128,
    pub base_proto: u128,
    pub quote_proto: u128,
}

impl PairFlow {
    pub fn accum_flow(&mut self, base: i128, quote: i128) -> Result<(), MathError> {
        self.base_flow = self.base_flow.checked_add(base).ok_or(MathError::Overflow)?;
        self.quote_flow = self.quote_flow.checked_add(quote).ok_or(MathError::Overflow)?;
        Ok(())
    }

    /// Adds the fee flows of one leg. The protocol's cut is tracked on the
    /// side the fee was charged on.
    pub fn accum_swap(
        &mut self,
        in_base_qty: bool,
        base: i128,
        quote: i128,
        proto: u128,
    ) -> Result<(), MathError> {
        self.accum_flow(base, quote)?;
        let side = if in_base_qty {
            &mut self.quote_proto
        } else {
            &mut self.base_proto
        };
        *side = side.checked_add(proto).ok_or(MathError::Overflow)?;
        Ok(())
    }

    /// Protocol fee of the swap in the token it was charged in.
    pub fn protocol_fee(&self) -> u128 {
        self.base_proto.max(self.quote_proto)
    }
}

/// Why a sweep stopped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SwapTermination {
    /// The whole quantity was filled.
    Exhausted,
    /// The curve reached the swap's limit price.
    LimitReached,
    /// No bookmarked tick is left in the swap direction and the curve hit
    /// the edge of the price domain.
    PriceBoundary,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SweepResult {
    pub flow: PairFlow,
    pub termination: SwapTermination,
    /// Tick-stable legs executed.
    pub legs: u32,
    /// Book levels crossed.
    pub crosses: u32,
}

/// Sweeps `swap` through the curve leg by leg, crossing every bookmarked
/// tick on the way, until the quantity is used up, the limit price is
/// reached or the price domain runs out.
///
/// `curve` and `store` are mutated in place; callers quoting against shared
/// state pass copies.
///
/// # Errors
///
/// - `SwapError::LimitPriceBehindCurve` if the limit sits on the wrong side
///   of the curve price.
/// - `SwapError::InsufficientLiquidity` if quantity remains and the curve
///   has run out of liquidity.
/// - Any error raised by the legs or tick crossings.
pub fn sweep_swap_liq<S: LevelStore + ?Sized>(
    store: &mut S,
    pool: &PoolId,
    spec: &PoolSpec,
    curve: &mut CurveState,
    swap: &mut SwapDirective,
) -> Result<SweepResult, Error> {
    let is_buy = swap.is_buy;
    let behind = if is_buy {
        swap.limit_price < curve.price_root
    } else {
        swap.limit_price > curve.price_root
    };
    if unlikely(behind) {
        return Err(SwapError::LimitPriceBehindCurve.into());
    }

    let mut flow = PairFlow::default();
    let mut legs = 0u32;
    let mut crosses = 0u32;
    if !has_swap_left(curve, swap) {
        return Ok(SweepResult {
            flow,
            termination: terminal_state(swap),
            legs,
            crosses,
        });
    }

    let mut mid_tick = get_tick_at_sqrt_ratio(curve.price_root)?;
    let termination = loop {
        let (mut bump_tick, spills_over) = pin_bitmap(store, pool, is_buy, mid_tick);
        swap_leg(curve, &mut flow, swap, spec, bump_tick, &mut legs)?;
        if !has_swap_left(curve, swap) {
            break terminal_state(swap);
        }

        if spills_over {
            let liq_tick = seek_mezz_spill(store, pool, bump_tick, is_buy);
            let tight_spill = liq_tick == bump_tick;
            bump_tick = liq_tick;

            if !tight_spill {
                swap_leg(curve, &mut flow, swap, spec, bump_tick, &mut legs)?;
                if !has_swap_left(curve, swap) {
                    break terminal_state(swap);
                }
            }
        }

        if !is_tick_finite(bump_tick) {
            break SwapTermination::PriceBoundary;
        }
        knock_in_tick(store, pool, curve, &mut flow, swap, bump_tick)?;
        crosses += 1;
        mid_tick = if is_buy { bump_tick } else { bump_tick - 1 };
    };

    if swap.qty > 0 && curve.active_liquidity()? == 0 {
        return Err(SwapError::InsufficientLiquidity.into());
    }
    Ok(SweepResult {
        flow,
        termination,
        legs,
        crosses,
    })
}

fn swap_leg(
    curve: &mut CurveState,
    flow: &mut PairFlow,
    swap: &mut SwapDirective,
    spec: &PoolSpec,
    bump_tick: i32,
    legs: &mut u32,
) -> Result<(), Error> {
    swap_to_limit(curve, flow, swap, spec, bump_tick)?;
    *legs += 1;
    trace!(
        bump_tick,
        price = curve.price_root,
        qty_left = swap.qty,
        "swap leg"
    );
    Ok(())
}

// The curve sits one unit short of the bump tick (or on it, going down).
// Cross the level, apply any knockout and push the price into the next tick.
fn knock_in_tick<S: LevelStore + ?Sized>(
    store: &mut S,
    pool: &PoolId,
    curve: &mut CurveState,
    flow: &mut PairFlow,
    swap: &mut SwapDirective,
    bump_tick: i32,
) -> Result<(), Error> {
    let fee_global = curve.conc_growth;
    let (liq_delta, knockout) = cross_level(store, pool, bump_tick, swap.is_buy, fee_global)?;
    curve.conc_liq = add_delta(curve.conc_liq, liq_delta)?;

    if knockout {
        let fee_range = cross_knockout(store, pool, !swap.is_buy, bump_tick, fee_global)?;
        debug!(bump_tick, fee_range, "knockout triggered by swap");
    }

    let (paid_base, paid_quote, burn_swap) =
        curve.shave_at_bump(swap.in_base_qty, swap.is_buy, swap.qty)?;
    flow.accum_flow(paid_base, paid_quote)?;
    swap.qty -= burn_swap;
    Ok(())
}

#[inline]
fn has_swap_left(curve: &CurveState, swap: &SwapDirective) -> bool {
    let in_limit = if swap.is_buy {
        curve.price_root < swap.limit_price
    } else {
        curve.price_root > swap.limit_price
    };
    in_limit && swap.qty > 0
}

#[inline]
fn terminal_state(swap: &SwapDirective) -> SwapTermination {
    if swap.qty == 0 {
        SwapTermination::Exhausted
    } else {
        SwapTermination::LimitReached
    }
}
