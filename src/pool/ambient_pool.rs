use crate::config::PoolSpec;
use crate::error::{Error, SimulationError, SwapError};
use crate::math::curve_math::CurveState;
use crate::math::math_helpers::unlikely;
use crate::pool::store::{ScratchStore, StoreView};
use crate::pool::swap::{sweep_swap_liq, SwapDirective, SwapTermination};
use crate::FastMap;
use alloy_primitives::{keccak256, Address, B256, U160};
use tracing::{debug, warn};

/// Identifies a pool: `keccak256(abi.encode(base, quote, pool_idx))`.
pub type PoolId = B256;

/// Converts an `Address` into its `U160` numeric representation.
#[inline(always)]
pub fn address_to_u160(address: Address) -> U160 {
    address.into()
}

/// Returns the pair ordered as `(base, quote)`: the base token is always
/// the one with the lower address.
pub fn sort_tokens(token_a: Address, token_b: Address) -> (Address, Address) {
    if address_to_u160(token_a) < address_to_u160(token_b) {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    }
}

/// Derives the pool id for a token pair and pool template index. The
/// tokens may be given in either order.
pub fn pool_id(token_a: Address, token_b: Address, pool_idx: u64) -> PoolId {
    let (base, quote) = sort_tokens(token_a, token_b);
    let mut buf = [0u8; 96];
    buf[12..32].copy_from_slice(base.as_slice());
    buf[44..64].copy_from_slice(quote.as_slice());
    buf[88..96].copy_from_slice(&pool_idx.to_be_bytes());
    keccak256(buf)
}

/// Everything the swap needs about a pool besides its book levels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolSnapshot {
    pub curve: CurveState,
    pub spec: PoolSpec,
}

/// Source of pool snapshots, keyed by pool id.
pub trait SnapshotProvider {
    fn snapshot(&self, pool: &PoolId) -> Option<PoolSnapshot>;
}

impl SnapshotProvider for FastMap<PoolId, PoolSnapshot> {
    fn snapshot(&self, pool: &PoolId) -> Option<PoolSnapshot> {
        self.get(pool).copied()
    }
}

impl<T: SnapshotProvider + ?Sized> SnapshotProvider for &T {
    fn snapshot(&self, pool: &PoolId) -> Option<PoolSnapshot> {
        (**self).snapshot(pool)
    }
}

/// Outcome of a simulated swap.
///
/// Flows are signed from the swapper's point of view as seen by the pool:
/// positive amounts are paid into the pool, negative amounts are received.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwapQuote {
    pub base_flow: i128,
    pub quote_flow: i128,
    /// Protocol's share of the exchange fee, in the token the fee was
    /// charged in (quote for base-denominated swaps, base otherwise).
    pub protocol_fee: u128,
    pub termination: SwapTermination,
    /// Curve price after the swap.
    pub end_price: u128,
    pub legs: u32,
    pub crosses: u32,
}

/// Quotes swaps against an immutable set of pool snapshots and book
/// levels.
///
/// Every simulation works on a private copy of the curve and a scratch
/// overlay of the store, so a simulator can be shared across threads and
/// queried concurrently without locking.
#[derive(Clone, Debug)]
pub struct AmbientSimulator<P, S> {
    provider: P,
    store: S,
}

impl<P, S> AmbientSimulator<P, S>
where
    P: SnapshotProvider,
    S: StoreView,
{
    pub fn new(provider: P, store: S) -> Self {
        Self { provider, store }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Simulates a swap of `qty` on `pool` without touching any state.
    ///
    /// `is_buy` pays base for quote; `in_base_qty` says which token `qty`
    /// is denominated in; `limit_price` is the Q64.64 square-root price the
    /// swap may not move past.
    ///
    /// # Errors
    ///
    /// Every failure maps to a [`SimulationError`] with a stable
    /// [`ErrorCode`](crate::error::ErrorCode).
    pub fn simulate_swap(
        &self,
        pool: &PoolId,
        is_buy: bool,
        in_base_qty: bool,
        qty: u128,
        limit_price: u128,
    ) -> Result<SwapQuote, SimulationError> {
        self.run_swap(pool, is_buy, in_base_qty, qty, limit_price)
            .map_err(|err| {
                warn!(%pool, is_buy, in_base_qty, qty, %err, "swap simulation rejected");
                SimulationError::from(err)
            })
    }

    fn run_swap(
        &self,
        pool: &PoolId,
        is_buy: bool,
        in_base_qty: bool,
        qty: u128,
        limit_price: u128,
    ) -> Result<SwapQuote, Error> {
        if unlikely(qty == 0) {
            return Err(SwapError::AmountSpecifiedIsZero.into());
        }
        let snapshot = self
            .provider
            .snapshot(pool)
            .ok_or(SwapError::UnknownPool)?;
        snapshot.spec.validate()?;

        let mut curve = snapshot.curve;
        let mut scratch = ScratchStore::new(&self.store);
        let mut swap = SwapDirective::new(is_buy, in_base_qty, qty, limit_price);
        let sweep = sweep_swap_liq(&mut scratch, pool, &snapshot.spec, &mut curve, &mut swap)?;

        let quote = SwapQuote {
            base_flow: sweep.flow.base_flow,
            quote_flow: sweep.flow.quote_flow,
            protocol_fee: sweep.flow.protocol_fee(),
            termination: sweep.termination,
            end_price: curve.price_root,
            legs: sweep.legs,
            crosses: sweep.crosses,
        };
        debug!(%pool, ?quote, "simulated swap");
        Ok(quote)
    }
}
