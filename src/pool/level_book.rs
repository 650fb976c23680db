//! Per-tick order book of concentrated liquidity.
//!
//! A range `[lower, upper)` is booked as bid lots on its lower tick and ask
//! lots on its upper tick. Crossing a tick upward adds `bid - ask` to the
//! curve's concentrated liquidity, crossing it downward removes it.

use crate::error::{Error, MathError, StateError};
use crate::math::liquidity_math::lots_to_liquidity;
use crate::pool::ambient_pool::PoolId;
use crate::pool::store::{LevelStore, PackedLevel, StoreView};
use crate::pool::tick_census::{bookmark_tick, forget_tick};
use tracing::debug;

const KNOCKOUT_FLAG: u128 = 1;

/// A lot count with its knockout marker split out of the low bit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Lots {
    /// Always even; the low bit of the packed form belongs to the flag.
    pub magnitude: u128,
    /// Set while a knockout pivot is active on this side of the level.
    pub knockout: bool,
}

impl Lots {
    pub fn unpack(packed: u128) -> Self {
        Self {
            magnitude: packed & !KNOCKOUT_FLAG,
            knockout: packed & KNOCKOUT_FLAG != 0,
        }
    }

    pub fn pack(self) -> u128 {
        self.magnitude | u128::from(self.knockout)
    }

    pub fn liquidity(self) -> u128 {
        lots_to_liquidity(self.magnitude)
    }

    pub fn is_zero(self) -> bool {
        self.pack() == 0
    }
}

/// A book level with unpacked lots.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BookLevel {
    pub bid_lots: Lots,
    pub ask_lots: Lots,
    /// Fee growth accumulated on the side of the tick away from the curve.
    pub fee_odometer: u64,
}

impl BookLevel {
    pub fn is_empty(&self) -> bool {
        self.bid_lots.is_zero() && self.ask_lots.is_zero()
    }

    /// Liquidity added to the curve when the price crosses this tick upward.
    pub fn net_liquidity(&self) -> Result<i128, MathError> {
        let bid = i128::try_from(self.bid_lots.liquidity()).map_err(|_| MathError::Overflow)?;
        let ask = i128::try_from(self.ask_lots.liquidity()).map_err(|_| MathError::Overflow)?;
        bid.checked_sub(ask).ok_or(MathError::Underflow)
    }
}

impl From<PackedLevel> for BookLevel {
    fn from(level: PackedLevel) -> Self {
        Self {
            bid_lots: Lots::unpack(level.bid_lots),
            ask_lots: Lots::unpack(level.ask_lots),
            fee_odometer: level.fee_odometer,
        }
    }
}

impl From<BookLevel> for PackedLevel {
    fn from(level: BookLevel) -> Self {
        Self {
            bid_lots: level.bid_lots.pack(),
            ask_lots: level.ask_lots.pack(),
            fee_odometer: level.fee_odometer,
        }
    }
}

/// Difference of two fee odometer readings, modulo 2^64. Odometers are only
/// ever compared against each other, so wrapping is the intended behaviour.
#[inline]
pub fn odometer_sub(later: u64, earlier: u64) -> u64 {
    later.wrapping_sub(earlier)
}

pub fn fetch_level<S: StoreView + ?Sized>(store: &S, pool: &PoolId, tick: i32) -> BookLevel {
    store.level(pool, tick).into()
}

pub(crate) fn commit_level<S: LevelStore + ?Sized>(
    store: &mut S,
    pool: &PoolId,
    tick: i32,
    level: BookLevel,
) {
    store.set_level(pool, tick, level.into());
}

/// Crosses the level at `tick`, flipping its odometer to the other side of
/// the curve.
///
/// Returns the change in concentrated liquidity and whether a knockout
/// pivot rests on the side being crossed: asks when buying, bids when
/// selling. Must run exactly once per tick and direction.
pub fn cross_level<S: LevelStore + ?Sized>(
    store: &mut S,
    pool: &PoolId,
    tick: i32,
    is_buy: bool,
    fee_global: u64,
) -> Result<(i128, bool), Error> {
    let mut level = fetch_level(store, pool, tick);
    let cross_delta = level.net_liquidity()?;
    let liq_delta = if is_buy {
        cross_delta
    } else {
        cross_delta.checked_neg().ok_or(MathError::Overflow)?
    };

    if level.fee_odometer != fee_global {
        level.fee_odometer = odometer_sub(fee_global, level.fee_odometer);
        commit_level(store, pool, tick, level);
    }

    let knockout = if is_buy {
        level.ask_lots.knockout
    } else {
        level.bid_lots.knockout
    };
    debug!(tick, is_buy, liq_delta, knockout, "crossed level");
    Ok((liq_delta, knockout))
}

/// Books `lots` on `[bid_tick, ask_tick)` and returns the fee growth
/// accumulated inside the range so far.
pub fn add_book_liq<S: LevelStore + ?Sized>(
    store: &mut S,
    pool: &PoolId,
    mid_tick: i32,
    bid_tick: i32,
    ask_tick: i32,
    lots: u128,
    fee_global: u64,
) -> Result<u64, Error> {
    init_level(store, pool, mid_tick, bid_tick, fee_global);
    init_level(store, pool, mid_tick, ask_tick, fee_global);

    let mut bid = fetch_level(store, pool, bid_tick);
    bid.bid_lots.magnitude = add_lots(bid.bid_lots.magnitude, lots)?;
    commit_level(store, pool, bid_tick, bid);

    let mut ask = fetch_level(store, pool, ask_tick);
    ask.ask_lots.magnitude = add_lots(ask.ask_lots.magnitude, lots)?;
    commit_level(store, pool, ask_tick, ask);

    Ok(clock_fee_odometer(store, pool, mid_tick, bid_tick, ask_tick, fee_global))
}

/// Takes `lots` off `[bid_tick, ask_tick)`, deleting levels that end up
/// empty, and returns the fee growth accumulated inside the range.
pub fn remove_book_liq<S: LevelStore + ?Sized>(
    store: &mut S,
    pool: &PoolId,
    mid_tick: i32,
    bid_tick: i32,
    ask_tick: i32,
    lots: u128,
    fee_global: u64,
) -> Result<u64, Error> {
    let fee_range = clock_fee_odometer(store, pool, mid_tick, bid_tick, ask_tick, fee_global);

    let mut bid = fetch_level(store, pool, bid_tick);
    bid.bid_lots.magnitude = sub_lots(bid.bid_lots.magnitude, lots)?;
    store_or_delete(store, pool, bid_tick, bid);

    let mut ask = fetch_level(store, pool, ask_tick);
    ask.ask_lots.magnitude = sub_lots(ask.ask_lots.magnitude, lots)?;
    store_or_delete(store, pool, ask_tick, ask);

    Ok(fee_range)
}

/// Fee growth accumulated inside `[lower_tick, upper_tick)` as seen from
/// `current_tick`: the growth above the lower tick minus the growth above
/// the upper tick, modulo 2^64.
pub fn clock_fee_odometer<S: StoreView + ?Sized>(
    store: &S,
    pool: &PoolId,
    current_tick: i32,
    lower_tick: i32,
    upper_tick: i32,
    fee_global: u64,
) -> u64 {
    let fee_lower = fee_above(store, pool, lower_tick, current_tick, fee_global);
    let fee_upper = fee_above(store, pool, upper_tick, current_tick, fee_global);
    odometer_sub(fee_lower, fee_upper)
}

fn fee_above<S: StoreView + ?Sized>(
    store: &S,
    pool: &PoolId,
    level_tick: i32,
    current_tick: i32,
    fee_global: u64,
) -> u64 {
    let odometer = store.level(pool, level_tick).fee_odometer;
    if level_tick <= current_tick {
        odometer_sub(fee_global, odometer)
    } else {
        odometer
    }
}

// A fresh level treats all fee growth so far as having happened below the
// curve.
fn init_level<S: LevelStore + ?Sized>(
    store: &mut S,
    pool: &PoolId,
    mid_tick: i32,
    tick: i32,
    fee_global: u64,
) {
    let level = fetch_level(store, pool, tick);
    if level.is_empty() {
        let fresh = BookLevel {
            fee_odometer: if tick <= mid_tick { fee_global } else { 0 },
            ..BookLevel::default()
        };
        commit_level(store, pool, tick, fresh);
        bookmark_tick(store, pool, tick);
    }
}

fn store_or_delete<S: LevelStore + ?Sized>(
    store: &mut S,
    pool: &PoolId,
    tick: i32,
    level: BookLevel,
) {
    if level.is_empty() {
        store.set_level(pool, tick, PackedLevel::default());
        forget_tick(store, pool, tick);
    } else {
        commit_level(store, pool, tick, level);
    }
}

fn add_lots(held: u128, lots: u128) -> Result<u128, Error> {
    if lots & KNOCKOUT_FLAG != 0 {
        return Err(StateError::LotsNotAligned.into());
    }
    Ok(held.checked_add(lots).ok_or(MathError::Overflow)?)
}

fn sub_lots(held: u128, lots: u128) -> Result<u128, Error> {
    Ok(held.checked_sub(lots).ok_or(StateError::InsufficientLots)?)
}
