//! Ambient (CrocSwap) concentrated-liquidity swap simulation in pure Rust.
//!
//! This crate exposes:
//! - Low‑level math primitives (`math::*`) for Q64.64 prices, Q16.48 growth
//!   rates, tick conversion, bitmaps and the locally stable constant-product
//!   curve.
//! - The pool-side bookkeeping (`pool::*`): the three-level tick census, the
//!   level book, knockout pivots and the multi-leg swap sweep.
//! - [`AmbientSimulator`], which quotes a swap against an immutable snapshot
//!   without ever mutating it.
//!
//! # Examples
//!
//! ## Pure math
//! ```no_run
//! use ambient_swap_math::math::tick_math;
//!
//! let price = tick_math::get_sqrt_ratio_at_tick(0).unwrap();
//! assert_eq!(price, 1u128 << 64);
//! ```
//!
//! ## Quoting a swap
//! ```no_run
//! use ambient_swap_math::{
//!     config::PoolSpec,
//!     math::tick_math::MAX_SQRT_RATIO,
//!     pool::{ambient_pool::AmbientSimulator, builder::PoolBuilder},
//!     FastMap,
//! };
//!
//! let spec = PoolSpec::new(3000, 0, 16).unwrap();
//! let mut builder = PoolBuilder::at_tick(Default::default(), spec, 0).unwrap();
//! builder.add_ambient(1_000_000_000_000_000_000).unwrap();
//! builder.add_range(-1600, 1600, 5_000_000_000_000_000_000).unwrap();
//! let (pool, snapshot, store) = builder.build();
//!
//! let mut snapshots = FastMap::default();
//! snapshots.insert(pool, snapshot);
//! let sim = AmbientSimulator::new(snapshots, store);
//!
//! // Pay 1e15 base tokens for as much quote as the curve gives.
//! let quote = sim
//!     .simulate_swap(&pool, true, true, 1_000_000_000_000_000, MAX_SQRT_RATIO - 1)
//!     .unwrap();
//! println!("base: {}, quote: {}", quote.base_flow, quote.quote_flow);
//! ```

pub use alloy_primitives::{Address, B256, I256, U256};

pub mod config;
pub mod error;
mod hash;
pub mod math;

pub use hash::FastMap;

pub mod pool;

pub use pool::ambient_pool::{AmbientSimulator, PoolId, PoolSnapshot, SwapQuote};

const U256_128: U256 = U256::from_limbs([128, 0, 0, 0]);

/// Bits of fractional precision in a square-root price.
pub const PRICE_RESOLUTION: u8 = 64;
/// Bits of fractional precision in a growth rate or deflator.
pub const GROWTH_RESOLUTION: u8 = 48;

pub const Q64: U256 = U256::from_limbs([0, 1, 0, 0]);
pub const Q128: U256 = U256::from_limbs([0, 0, 1, 0]);
