//! Seeds a pool snapshot and its book the way minting would on chain.

use crate::config::PoolSpec;
use crate::error::Error;
use crate::math::compound_math::deflate_liq_seed;
use crate::math::curve_math::CurveState;
use crate::math::liquidity_math::{add_liq, liquidity_to_lots};
use crate::math::tick_math::{get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio};
use crate::pool::ambient_pool::{PoolId, PoolSnapshot};
use crate::pool::knockout::{add_knockout, KnockoutOrder};
use crate::pool::level_book::add_book_liq;
use crate::pool::store::MemoryStore;

#[derive(Clone, Debug)]
pub struct PoolBuilder {
    pool: PoolId,
    spec: PoolSpec,
    curve: CurveState,
    store: MemoryStore,
    mid_tick: i32,
}

impl PoolBuilder {
    /// Starts an empty pool priced exactly at `tick`.
    pub fn at_tick(pool: PoolId, spec: PoolSpec, tick: i32) -> Result<Self, Error> {
        let price = get_sqrt_ratio_at_tick(tick)?;
        Self::at_price(pool, spec, price)
    }

    /// Starts an empty pool at a Q64.64 square-root price.
    pub fn at_price(pool: PoolId, spec: PoolSpec, price: u128) -> Result<Self, Error> {
        spec.validate()?;
        let mid_tick = get_tick_at_sqrt_ratio(price)?;
        Ok(Self {
            pool,
            spec,
            curve: CurveState::new(price, 0, 0),
            store: MemoryStore::new(),
            mid_tick,
        })
    }

    /// Books liquidity into an existing store, e.g. one shared by several
    /// pools.
    pub fn with_store(mut self, store: MemoryStore) -> Self {
        self.store = store;
        self
    }

    pub fn curve(&self) -> &CurveState {
        &self.curve
    }

    /// Adds full-range liquidity, stored as seeds at the current deflator.
    pub fn add_ambient(&mut self, liq: u128) -> Result<&mut Self, Error> {
        let seeds = deflate_liq_seed(liq, self.curve.seed_deflator);
        self.curve.ambient_seeds = add_liq(self.curve.ambient_seeds, seeds)?;
        Ok(self)
    }

    /// Adds concentrated liquidity on `[lower, upper)`. `liq` must be a
    /// whole, even number of lots.
    pub fn add_range(&mut self, lower: i32, upper: i32, liq: u128) -> Result<&mut Self, Error> {
        self.spec.check_range(lower, upper)?;
        let lots = liquidity_to_lots(liq)?;
        add_book_liq(
            &mut self.store,
            &self.pool,
            self.mid_tick,
            lower,
            upper,
            lots,
            self.curve.conc_growth,
        )?;
        if lower <= self.mid_tick && self.mid_tick < upper {
            self.curve.conc_liq = add_liq(self.curve.conc_liq, liq)?;
        }
        Ok(self)
    }

    /// Places a knockout order on `[lower, upper)` and returns the tranche
    /// time it joined. Knockout orders never start in range.
    pub fn add_knockout(&mut self, is_bid: bool, lower: i32, upper: i32, liq: u128) -> Result<u32, Error> {
        self.spec.check_range(lower, upper)?;
        let lots = liquidity_to_lots(liq)?;
        let order = KnockoutOrder {
            is_bid,
            lower,
            upper,
            lots,
        };
        add_knockout(
            &mut self.store,
            &self.pool,
            self.mid_tick,
            order,
            self.curve.conc_growth,
        )
    }

    pub fn build(self) -> (PoolId, PoolSnapshot, MemoryStore) {
        let snapshot = PoolSnapshot {
            curve: self.curve,
            spec: self.spec,
        };
        (self.pool, snapshot, self.store)
    }
}
