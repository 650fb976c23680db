//! Property-based checks of the curve and book laws:
//!
//! 1. **Tick round trip**: `tick_at(price_at(t)) == t` below the top tick,
//!    whose price sits on the exclusive upper price bound.
//! 2. **Compound stacking**: zero is the identity, stack and shrink are
//!    monotone.
//! 3. **Fee assimilation**: liquidity never shrinks and never outgrows the
//!    square root of the fee-implied reserve growth.
//! 4. **Census search**: pin + spill agrees with a brute-force scan and
//!    always terminates.
//! 5. **Knockout parity**: the pivot side of a level stays odd while the
//!    pivot is active.

use proptest::prelude::*;

use crate::math::compound_math::{compound_shrink, compound_stack};
use crate::math::curve_math::{reserve_at_price, CurveState};
use crate::math::tick_bitmap::{ZERO_TICK_LOWER, ZERO_TICK_UPPER};
use crate::math::tick_math::{get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio, MAX_TICK, MIN_TICK};
use crate::pool::ambient_pool::PoolId;
use crate::pool::knockout::{add_knockout, cross_knockout, KnockoutOrder, PivotKey};
use crate::pool::level_book::add_book_liq;
use crate::pool::store::{MemoryStore, StoreView};
use crate::pool::tick_census::{bookmark_tick, pin_bitmap, seek_mezz_spill};
use crate::U256;
use alloy_primitives::B256;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn pool() -> PoolId {
    B256::repeat_byte(0xaa)
}

fn next_bump(store: &MemoryStore, is_upper: bool, start: i32) -> i32 {
    let (tick, spills) = pin_bitmap(store, &pool(), is_upper, start);
    if spills {
        seek_mezz_spill(store, &pool(), tick, is_upper)
    } else {
        tick
    }
}

fn brute_force_bump(ticks: &[i32], is_upper: bool, start: i32) -> i32 {
    if is_upper {
        ticks
            .iter()
            .copied()
            .filter(|t| *t > start)
            .min()
            .unwrap_or(ZERO_TICK_UPPER)
    } else {
        ticks
            .iter()
            .copied()
            .filter(|t| *t <= start)
            .max()
            .unwrap_or(ZERO_TICK_LOWER)
    }
}

// ---------------------------------------------------------------------------
// 1. Tick round trip
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_tick_round_trip(tick in MIN_TICK..MAX_TICK) {
        let price = get_sqrt_ratio_at_tick(tick).unwrap();
        prop_assert_eq!(get_tick_at_sqrt_ratio(price).unwrap(), tick);
    }
}

// ---------------------------------------------------------------------------
// 2. Compound stacking
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_stack_zero_is_identity(x in any::<u64>()) {
        prop_assert_eq!(compound_stack(x, 0), x);
        prop_assert_eq!(compound_stack(0, x), x);
    }

    #[test]
    fn prop_stack_is_monotone(a in any::<u64>(), b in any::<u64>(), y in any::<u64>()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(compound_stack(lo, y) <= compound_stack(hi, y));
        prop_assert!(compound_stack(y, lo) <= compound_stack(y, hi));
    }

    #[test]
    fn prop_shrink_is_monotone(a in any::<u64>(), b in any::<u64>(), d in any::<u64>()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(compound_shrink(lo, d) <= compound_shrink(hi, d));
        prop_assert!(compound_shrink(d, hi) <= compound_shrink(d, lo));
        prop_assert!(compound_shrink(d, lo) <= d);
    }
}

// ---------------------------------------------------------------------------
// 3. Fee assimilation
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_assimilation_is_bounded(
        ambient in 1_000_000_000u128..1_000_000_000_000_000_000_000_000,
        conc_share in 0u128..=100,
        tick in -1_000i32..1_000,
        fee_frac in 0u128..=250,
    ) {
        let conc = ambient / 100 * conc_share;
        let price = get_sqrt_ratio_at_tick(tick).unwrap();
        let mut curve = CurveState::new(price, ambient, conc);
        let before = curve.active_liquidity().unwrap();
        // fees on the base side, at most a quarter of the base reserve
        let reserve = reserve_at_price(before, price, true).unwrap();
        let fees = reserve / 1_000 * fee_frac;

        curve.assimilate_liq(fees, false).unwrap();
        let after = curve.active_liquidity().unwrap();

        prop_assert!(after >= before);
        let lhs = U256::from(after) * U256::from(after) * U256::from(reserve);
        let rhs = U256::from(before) * U256::from(before) * (U256::from(reserve) + U256::from(fees));
        prop_assert!(lhs <= rhs);
        if fees == 0 {
            prop_assert_eq!(curve, CurveState::new(price, ambient, conc));
        }
    }
}

// ---------------------------------------------------------------------------
// 4. Census search
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_census_matches_brute_force(
        ticks in prop::collection::vec(MIN_TICK..=MAX_TICK, 0..12),
        start in MIN_TICK..=MAX_TICK,
        is_upper in any::<bool>(),
    ) {
        let mut store = MemoryStore::new();
        for tick in &ticks {
            bookmark_tick(&mut store, &pool(), *tick);
        }
        prop_assert_eq!(
            next_bump(&store, is_upper, start),
            brute_force_bump(&ticks, is_upper, start)
        );
    }

    #[test]
    fn prop_census_walk_terminates(
        ticks in prop::collection::vec(-300_000i32..300_000, 1..8),
        is_upper in any::<bool>(),
    ) {
        let mut store = MemoryStore::new();
        for tick in &ticks {
            bookmark_tick(&mut store, &pool(), *tick);
        }
        let mut seen = 0usize;
        let mut cursor = if is_upper { MIN_TICK } else { MAX_TICK };
        loop {
            let bump = next_bump(&store, is_upper, cursor);
            if bump == ZERO_TICK_UPPER || bump == ZERO_TICK_LOWER {
                break;
            }
            seen += 1;
            prop_assert!(seen <= ticks.len());
            cursor = if is_upper { bump } else { bump - 1 };
        }
        let mut distinct = ticks.clone();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(seen, distinct.len());
    }
}

// ---------------------------------------------------------------------------
// 5. Knockout parity
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_knockout_parity(
        orders in prop::collection::vec(1u128..1_000, 1..6),
        plain in 0u128..1_000,
    ) {
        let mut store = MemoryStore::new();
        if plain > 0 {
            add_book_liq(&mut store, &pool(), 0, -200, 50, plain * 2, 0).unwrap();
        }
        for lots in &orders {
            add_knockout(&mut store, &pool(), 0, KnockoutOrder::bid(-200, -100, lots * 2), 0).unwrap();
            prop_assert_eq!(store.level(&pool(), -200).bid_lots % 2, 1);
        }

        let key = PivotKey::new(pool(), true, -200);
        let total: u128 = orders.iter().map(|lots| lots * 2).sum();
        prop_assert_eq!(store.knockout_pivot(&key).lots, total);

        cross_knockout(&mut store, &pool(), true, -200, 0).unwrap();
        prop_assert_eq!(store.level(&pool(), -200).bid_lots, plain * 2);
        prop_assert_eq!(store.knockout_pivot(&key).lots, 0);
    }
}
