#![allow(dead_code)]

use ambient_swap_math::config::PoolSpec;
use ambient_swap_math::math::bit_math::{bit_after_trunc, most_significant_bit};
use ambient_swap_math::math::compound_math::{approx_sqrt_compound, compound_divide, compound_stack};
use ambient_swap_math::math::curve_math::{delta_base, delta_quote, invert_flow, CurveState};
use ambient_swap_math::math::math_helpers::mul_div;
use ambient_swap_math::math::swap_math::{calc_fee_over_swap, determine_limit};
use ambient_swap_math::math::tick_bitmap::{pin_term_mezz, term_bump};
use ambient_swap_math::math::tick_math::{get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio, MAX_SQRT_RATIO};
use ambient_swap_math::pool::ambient_pool::{AmbientSimulator, PoolId, PoolSnapshot};
use ambient_swap_math::pool::builder::PoolBuilder;
use ambient_swap_math::pool::store::MemoryStore;
use ambient_swap_math::{FastMap, B256, U256};
use criterion::{black_box, Criterion};

const PRICE_ONE: u128 = 1 << 64;
const E18: u128 = 1_000_000_000_000_000_000;

pub fn bench_tick_math(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_math");
    group.bench_function("get_sqrt_ratio_at_tick", |b| {
        b.iter(|| get_sqrt_ratio_at_tick(black_box(-123_456)))
    });
    group.bench_function("get_tick_at_sqrt_ratio", |b| {
        b.iter(|| get_tick_at_sqrt_ratio(black_box(30412779051191548723)))
    });
    group.finish();
}

pub fn bench_compound_math(c: &mut Criterion) {
    let mut group = c.benchmark_group("compound_math");
    group.bench_function("approx_sqrt_compound", |b| {
        b.iter(|| approx_sqrt_compound(black_box(1 << 40)))
    });
    group.bench_function("compound_divide", |b| {
        b.iter(|| compound_divide(black_box(U256::from(E18 + 3_000)), black_box(U256::from(E18))))
    });
    group.bench_function("compound_stack", |b| {
        b.iter(|| compound_stack(black_box(1 << 30), black_box(1 << 44)))
    });
    group.finish();
}

pub fn bench_curve_math(c: &mut Criterion) {
    let mut group = c.benchmark_group("curve_math");
    let price = get_sqrt_ratio_at_tick(1_000).unwrap();
    group.bench_function("delta_base", |b| {
        b.iter(|| delta_base(black_box(E18), black_box(PRICE_ONE), black_box(price)))
    });
    group.bench_function("delta_quote", |b| {
        b.iter(|| delta_quote(black_box(E18), black_box(PRICE_ONE), black_box(price)))
    });
    group.bench_function("invert_flow", |b| {
        b.iter(|| invert_flow(black_box(E18), black_box(PRICE_ONE), black_box(E18 / 100), true, true))
    });
    group.bench_function("assimilate_liq", |b| {
        b.iter(|| {
            let mut curve = CurveState::new(PRICE_ONE, E18, E18 / 2);
            curve.assimilate_liq(black_box(3_000_000_000_000), true)
        })
    });
    group.finish();
}

pub fn bench_swap_math(c: &mut Criterion) {
    let mut group = c.benchmark_group("swap_math");
    let spec = PoolSpec::new(3000, 64, 1).unwrap();
    let curve = CurveState::new(PRICE_ONE, E18, 0);
    group.bench_function("determine_limit", |b| {
        b.iter(|| determine_limit(black_box(1_000), black_box(MAX_SQRT_RATIO - 1), true))
    });
    group.bench_function("calc_fee_over_swap", |b| {
        b.iter(|| calc_fee_over_swap(&curve, black_box(E18 / 100), &spec, true, MAX_SQRT_RATIO - 1))
    });
    group.finish();
}

pub fn bench_math_helpers(c: &mut Criterion) {
    c.bench_function("mul_div", |b| {
        b.iter(|| {
            mul_div(
                black_box(U256::from(u128::MAX)),
                black_box(U256::from(u128::MAX - 7)),
                black_box(U256::from(u64::MAX)),
            )
        })
    });
}

pub fn bench_bitmaps(c: &mut Criterion) {
    let mut group = c.benchmark_group("bitmaps");
    let word = (U256::ONE << 200usize) | (U256::ONE << 17usize);
    group.bench_function("most_significant_bit", |b| {
        b.iter(|| most_significant_bit(black_box(word)))
    });
    group.bench_function("bit_after_trunc", |b| {
        b.iter(|| bit_after_trunc(black_box(word), black_box(18), true))
    });
    group.bench_function("pin_term_mezz", |b| {
        b.iter(|| pin_term_mezz(true, term_bump(black_box(17), true), 0, black_box(word)))
    });
    group.finish();
}

/// A pool with ambient liquidity and a ladder of ranges every 200 ticks, so
/// large swaps cross many levels.
pub fn laddered_pool() -> (PoolId, AmbientSimulator<FastMap<PoolId, PoolSnapshot>, MemoryStore>) {
    let spec = PoolSpec::new(3000, 64, 10).unwrap();
    let mut builder = PoolBuilder::at_tick(B256::repeat_byte(0x42), spec, 0).unwrap();
    builder.add_ambient(E18).unwrap();
    for i in 1..=50 {
        builder.add_range(-200 * i, 200 * i, 1 << 58).unwrap();
    }
    builder.add_knockout(false, 4_000, 4_200, 1 << 50).unwrap();
    let (pool, snapshot, store) = builder.build();
    let mut snapshots = FastMap::default();
    snapshots.insert(pool, snapshot);
    (pool, AmbientSimulator::new(snapshots, store))
}

pub fn bench_simulate_swap(c: &mut Criterion) {
    let (pool, sim) = laddered_pool();
    let mut group = c.benchmark_group("simulate_swap");
    group.bench_function("single_leg", |b| {
        b.iter(|| sim.simulate_swap(&pool, true, true, black_box(E18 / 1_000), MAX_SQRT_RATIO - 1))
    });
    group.bench_function("many_crossings", |b| {
        b.iter(|| sim.simulate_swap(&pool, true, true, black_box(50 * E18), MAX_SQRT_RATIO - 1))
    });
    group.bench_function("quote_denominated_sell", |b| {
        b.iter(|| sim.simulate_swap(&pool, false, false, black_box(10 * E18), 65538))
    });
    group.finish();
}
