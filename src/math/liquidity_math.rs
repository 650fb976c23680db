use crate::error::{MathError, StateError};

/// Each lot on a level stands for `2^LOT_SIZE_BITS` units of liquidity.
pub const LOT_SIZE_BITS: u32 = 10;

const LOT_ACTIVE_MASK: u128 = !1;
const MAX_LOTS: u128 = 1 << 96;

pub fn add_delta(x: u128, y: i128) -> Result<u128, MathError> {
    if y < 0 {
        x.checked_sub(y.unsigned_abs()).ok_or(MathError::Underflow)
    } else {
        x.checked_add(y as u128).ok_or(MathError::Overflow)
    }
}

pub fn add_liq(x: u128, y: u128) -> Result<u128, MathError> {
    x.checked_add(y).ok_or(MathError::Overflow)
}

/// Liquidity carried by a packed lot count. The low bit is the knockout
/// flag and never counts towards liquidity.
#[inline]
pub fn lots_to_liquidity(lots: u128) -> u128 {
    (lots & LOT_ACTIVE_MASK) << LOT_SIZE_BITS
}

/// Converts liquidity to a lot count. The liquidity must be a whole number
/// of lots, leave the flag bit clear and stay under 2^96 lots.
pub fn liquidity_to_lots(liq: u128) -> Result<u128, StateError> {
    let lots = liq >> LOT_SIZE_BITS;
    if lots << LOT_SIZE_BITS != liq || lots & 1 != 0 || lots >= MAX_LOTS {
        return Err(StateError::LotsNotAligned);
    }
    Ok(lots)
}
