//! Knockout range orders and their Merkle history.
//!
//! A knockout bid sits below the curve and is keyed by its lower tick; it
//! is knocked out when a sell crosses that tick. A knockout ask sits above
//! the curve and is keyed by its upper tick, knocked out by a buy. While a
//! pivot is active the pivot side of its level carries the knockout flag,
//! which keeps the packed lot count on that side odd.
//!
//! Every knockout folds the previous head of the pivot's history into a
//! hash chain, so claimants can later prove a tranche was knocked out
//! without the ledger keeping every event.

use crate::error::{ConfigError, Error, MathError, StateError};
use crate::pool::ambient_pool::PoolId;
use crate::pool::level_book::{add_book_liq, commit_level, fetch_level, remove_book_liq};
use crate::pool::store::LevelStore;
use alloy_primitives::{keccak256, B256};
use tracing::debug;

/// Identifies the pivot of a knockout tranche.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PivotKey {
    pub pool: PoolId,
    pub is_bid: bool,
    pub tick: i32,
}

impl PivotKey {
    pub fn new(pool: PoolId, is_bid: bool, tick: i32) -> Self {
        Self { pool, is_bid, tick }
    }
}

/// Live tranche resting on a pivot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct KnockoutPivot {
    pub lots: u128,
    /// Tranche identity. Liquidity added after a knockout lands in a new
    /// tranche with a later time.
    pub pivot_time: u32,
    /// Width shared by every order on this pivot.
    pub range_ticks: u16,
}

/// One knocked-out tranche as recorded in the history chain.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MerkleEntry {
    pub pivot_time: u32,
    pub fee_mileage: u64,
}

/// History of knockouts at a pivot. The latest entry is kept in the clear,
/// everything older is folded into `merkle_root`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct KnockoutMerkle {
    pub merkle_root: B256,
    pub pivot_time: u32,
    pub fee_mileage: u64,
}

impl KnockoutMerkle {
    pub fn head(&self) -> MerkleEntry {
        MerkleEntry {
            pivot_time: self.pivot_time,
            fee_mileage: self.fee_mileage,
        }
    }

    /// Records the knockout of `pivot`, which earned `fee_mileage` of fee
    /// growth while active.
    pub fn commit_knockout(&mut self, pivot: &KnockoutPivot, fee_mileage: u64) {
        self.merkle_root = chain_root(self.merkle_root, self.head());
        self.pivot_time = pivot.pivot_time;
        self.fee_mileage = fee_mileage;
    }

    /// Checks that `entry` was knocked out at this pivot.
    ///
    /// `base_root` is the chain root at the time `entry` was the head and
    /// `trailing` lists, oldest first, the entries committed after it up to
    /// but excluding the current head.
    pub fn prove_history(&self, base_root: B256, entry: MerkleEntry, trailing: &[MerkleEntry]) -> bool {
        if trailing.is_empty() && base_root == self.merkle_root && entry == self.head() {
            return true;
        }
        let root = trailing
            .iter()
            .fold(chain_root(base_root, entry), |root, next| chain_root(root, *next));
        root == self.merkle_root
    }
}

/// `keccak256(root ‖ pivot_time ‖ fee_mileage)`, integers big-endian.
pub fn chain_root(root: B256, entry: MerkleEntry) -> B256 {
    let mut buf = [0u8; 44];
    buf[..32].copy_from_slice(root.as_slice());
    buf[32..36].copy_from_slice(&entry.pivot_time.to_be_bytes());
    buf[36..].copy_from_slice(&entry.fee_mileage.to_be_bytes());
    keccak256(buf)
}

/// Pivot tick of a knockout range: the lower tick for bids, the upper tick
/// for asks.
pub fn pivot_tick(is_bid: bool, lower: i32, upper: i32) -> i32 {
    if is_bid {
        lower
    } else {
        upper
    }
}

/// A knockout range order on `[lower, upper)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KnockoutOrder {
    pub is_bid: bool,
    pub lower: i32,
    pub upper: i32,
    pub lots: u128,
}

impl KnockoutOrder {
    pub fn bid(lower: i32, upper: i32, lots: u128) -> Self {
        Self {
            is_bid: true,
            lower,
            upper,
            lots,
        }
    }

    pub fn ask(lower: i32, upper: i32, lots: u128) -> Self {
        Self {
            is_bid: false,
            lower,
            upper,
            lots,
        }
    }

    pub fn pivot_tick(&self) -> i32 {
        pivot_tick(self.is_bid, self.lower, self.upper)
    }
}

/// Places a knockout order and returns the tranche time it joined.
///
/// # Errors
///
/// - `StateError::KnockoutPosition` unless a bid sits at or below the curve
///   tick and an ask sits strictly above it.
/// - `StateError::KnockoutRangeMismatch` if the pivot already holds orders
///   of a different width.
pub fn add_knockout<S: LevelStore + ?Sized>(
    store: &mut S,
    pool: &PoolId,
    curve_tick: i32,
    order: KnockoutOrder,
    fee_global: u64,
) -> Result<u32, Error> {
    let KnockoutOrder {
        is_bid,
        lower,
        upper,
        lots,
    } = order;
    let in_position = if is_bid {
        upper <= curve_tick
    } else {
        lower > curve_tick
    };
    if !in_position {
        return Err(StateError::KnockoutPosition.into());
    }
    let range_ticks = upper
        .checked_sub(lower)
        .filter(|width| *width > 0)
        .and_then(|width| u16::try_from(width).ok())
        .ok_or(ConfigError::InvalidRange(lower, upper))?;

    let tick = order.pivot_tick();
    let key = PivotKey::new(*pool, is_bid, tick);
    let mut pivot = store.knockout_pivot(&key);
    let fresh = pivot.lots == 0;

    if fresh {
        let merkle = store.knockout_merkle(&key);
        pivot.pivot_time = merkle.pivot_time.checked_add(1).ok_or(MathError::Overflow)?;
        pivot.range_ticks = range_ticks;
    } else if pivot.range_ticks != range_ticks {
        return Err(StateError::KnockoutRangeMismatch.into());
    }
    pivot.lots = pivot.lots.checked_add(lots).ok_or(MathError::Overflow)?;

    add_book_liq(store, pool, curve_tick, lower, upper, lots, fee_global)?;
    if fresh {
        set_pivot_flag(store, pool, is_bid, tick, true);
    }
    store.set_knockout_pivot(&key, pivot);
    Ok(pivot.pivot_time)
}

/// Knocks out the tranche pivoting on `tick` after the curve has crossed
/// it, returning the fee growth the tranche earned.
///
/// Clears the level flag, pulls the whole range out of the book, commits
/// the tranche to the history chain and deletes the pivot.
pub fn cross_knockout<S: LevelStore + ?Sized>(
    store: &mut S,
    pool: &PoolId,
    is_bid: bool,
    tick: i32,
    fee_global: u64,
) -> Result<u64, Error> {
    let key = PivotKey::new(*pool, is_bid, tick);
    let pivot = store.knockout_pivot(&key);
    if pivot.lots == 0 {
        return Err(StateError::MissingPivot.into());
    }

    set_pivot_flag(store, pool, is_bid, tick, false);
    let fee_range = knockout_range_liq(store, pool, &pivot, is_bid, tick, fee_global)?;

    let mut merkle = store.knockout_merkle(&key);
    merkle.commit_knockout(&pivot, fee_range);
    store.set_knockout_merkle(&key, merkle);
    store.set_knockout_pivot(&key, KnockoutPivot::default());

    debug!(tick, is_bid, pivot_time = pivot.pivot_time, fee_range, "knocked out tranche");
    Ok(fee_range)
}

fn knockout_range_liq<S: LevelStore + ?Sized>(
    store: &mut S,
    pool: &PoolId,
    pivot: &KnockoutPivot,
    is_bid: bool,
    tick: i32,
    fee_global: u64,
) -> Result<u64, Error> {
    let range = i32::from(pivot.range_ticks);
    let (lower, upper, price_tick) = if is_bid {
        (tick, tick + range, tick - 1)
    } else {
        (tick - range, tick, tick)
    };
    remove_book_liq(store, pool, price_tick, lower, upper, pivot.lots, fee_global)
}

fn set_pivot_flag<S: LevelStore + ?Sized>(
    store: &mut S,
    pool: &PoolId,
    is_bid: bool,
    tick: i32,
    knockout: bool,
) {
    let mut level = fetch_level(store, pool, tick);
    if is_bid {
        level.bid_lots.knockout = knockout;
    } else {
        level.ask_lots.knockout = knockout;
    }
    commit_level(store, pool, tick, level);
}
