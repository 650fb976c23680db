use crate::error::StateError;
use crate::math::math_helpers::saturating_u128;
use crate::U256_128;
use alloy_primitives::{I256, U256};

/// Lowest tick whose square-root price is representable in Q64.64.
pub const MIN_TICK: i32 = -665454;
/// Highest tick whose square-root price fits in 128 bits.
pub const MAX_TICK: i32 = 831818;

pub const MIN_SQRT_RATIO: u128 = 65538;
pub const MAX_SQRT_RATIO: u128 = 21267430153580247136652501917186561138;

pub const SQRT_10001: I256 = I256::from_raw(U256::from_limbs([11745905768312294533, 13863, 0, 0]));
pub const TICK_LOW: I256 = I256::from_raw(U256::from_limbs([
    6552757943157144234,
    184476617836266586,
    0,
    0,
]));
pub const TICK_HIGH: I256 = I256::from_raw(U256::from_limbs([
    4998474450511881007,
    15793544031827761793,
    0,
    0,
]));

/// Returns the Q64.64 square-root price at a given tick, or
/// `StateError::TickOutOfBounds` outside `[MIN_TICK, MAX_TICK]`.
///
/// The ratio is built in Q128.128 from the per-bit multipliers of
/// `sqrt(1.0001)^-2^i`, then rounded up into Q64.64.
pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<u128, StateError> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(StateError::TickOutOfBounds);
    }
    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 1 != 0 {
        U256::from_limbs([12262481743371124737, 18445821805675392311, 0, 0])
    } else {
        U256::from_limbs([0, 0, 1, 0])
    };

    macro_rules! apply_multiplier {
        ($bit:expr, $l0:expr, $l1:expr) => {
            if abs_tick & $bit != 0 {
                ratio = ratio.wrapping_mul(U256::from_limbs([$l0, $l1, 0, 0])) >> 128;
            }
        };
    }

    apply_multiplier!(2, 6459403834229662010, 18444899583751176498);
    apply_multiplier!(4, 17226890335427755468, 18443055278223354162);
    apply_multiplier!(8, 2032852871939366096, 18439367220385604838);
    apply_multiplier!(16, 14545316742740207172, 18431993317065449817);
    apply_multiplier!(32, 5129152022828963008, 18417254355718160513);
    apply_multiplier!(64, 4894419605888772193, 18387811781193591352);
    apply_multiplier!(128, 1280255884321894483, 18329067761203520168);
    apply_multiplier!(256, 15924666964335305636, 18212142134806087854);
    apply_multiplier!(512, 8010504389359918676, 17980523815641551639);
    apply_multiplier!(1024, 10668036004952895731, 17526086738831147013);
    apply_multiplier!(2048, 4878133418470705625, 16651378430235024244);
    apply_multiplier!(4096, 9537173718739605541, 15030750278693429944);
    apply_multiplier!(8192, 9972618978014552549, 12247334978882834399);
    apply_multiplier!(16384, 10428997489610666743, 8131365268884726200);
    apply_multiplier!(32768, 9305304367709015974, 3584323654723342297);
    apply_multiplier!(65536, 14301143598189091785, 696457651847595233);
    apply_multiplier!(131072, 7393154844743099908, 26294789957452057);
    apply_multiplier!(262144, 2209338891292245656, 37481735321082);
    apply_multiplier!(524288, 10518117631919034274, 76158723);

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    let round_up = ratio.as_limbs()[0] != 0;
    Ok(saturating_u128(ratio >> 64) + round_up as u128)
}

const SHIFT_64: usize = 64;
const SHIFT_127: usize = 127;
const SHIFT_128: usize = 128;

const MASK_128: U256 = U256::from_limbs([u64::MAX, u64::MAX, 0, 0]);
const MASK_64: U256 = U256::from_limbs([u64::MAX, 0, 0, 0]);
const MASK_32: U256 = U256::from_limbs([u32::MAX as u64, 0, 0, 0]);
const MASK_16: U256 = U256::from_limbs([u16::MAX as u64, 0, 0, 0]);

#[inline(always)]
fn compute_msb_optimized(mut r: U256) -> u32 {
    let mut msb: u32 = 0;

    if r > MASK_128 {
        msb |= 128;
        r >>= 128;
    }
    if r > MASK_64 {
        msb |= 64;
        r >>= 64;
    }
    if r > MASK_32 {
        msb |= 32;
        r >>= 32;
    }
    if r > MASK_16 {
        msb |= 16;
        r >>= 16;
    }
    if r > U256::from(255u64) {
        msb |= 8;
        r >>= 8;
    }
    if r > U256::from(15u64) {
        msb |= 4;
        r >>= 4;
    }
    if r > U256::from(3u64) {
        msb |= 2;
        r >>= 2;
    }
    if r > U256::ONE {
        msb |= 1;
    }

    msb
}

/// Computes the greatest tick whose square-root price is at or below the
/// given Q64.64 price. Valid for `[MIN_SQRT_RATIO, MAX_SQRT_RATIO)`.
///
/// The log2 is taken on the Q128.128 lift of the price, then converted to a
/// log base sqrt(1.0001) with an error band narrow enough that at most two
/// candidate ticks remain.
pub fn get_tick_at_sqrt_ratio(sqrt_price: u128) -> Result<i32, StateError> {
    if !(MIN_SQRT_RATIO..MAX_SQRT_RATIO).contains(&sqrt_price) {
        return Err(StateError::SqrtPriceOutOfBounds);
    }

    let ratio = U256::from(sqrt_price) << SHIFT_64;
    let msb = compute_msb_optimized(ratio);

    let mut r = if msb >= 128 {
        ratio >> (msb - 127) as usize
    } else {
        ratio << (127 - msb) as usize
    };

    let mut log_2 = I256::from_raw(U256::from(msb) << SHIFT_64)
        - I256::from_raw(U256_128 << SHIFT_64);

    macro_rules! log2_step {
        ($shift:expr) => {{
            r = r.wrapping_mul(r) >> SHIFT_127;
            let f = r >> SHIFT_128;
            log_2 |= I256::from_raw(f << ($shift as usize));
            r >>= f.as_limbs()[0] as usize;
        }};
    }

    log2_step!(63);
    log2_step!(62);
    log2_step!(61);
    log2_step!(60);
    log2_step!(59);
    log2_step!(58);
    log2_step!(57);
    log2_step!(56);
    log2_step!(55);
    log2_step!(54);
    log2_step!(53);
    log2_step!(52);
    log2_step!(51);
    log2_step!(50);

    let log_sqrt10001 = log_2.wrapping_mul(SQRT_10001);
    let tick_low = (log_sqrt10001 - TICK_LOW).asr(SHIFT_128).low_i32();
    let tick_high = (log_sqrt10001 + TICK_HIGH).asr(SHIFT_128).low_i32();

    Ok(if tick_low == tick_high {
        tick_low
    } else if get_sqrt_ratio_at_tick(tick_high)? <= sqrt_price {
        tick_high
    } else {
        tick_low
    })
}
