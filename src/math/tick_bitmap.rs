//! Index arithmetic for the three-layer tick census.
//!
//! A 24-bit tick splits into a lobby byte (top 8 bits), a mezzanine byte
//! and a terminus byte. Terminus words are keyed by the 16-bit mezzanine key
//! (lobby and mezzanine byte welded together) and carry one bit per tick.
//! Mezzanine words are keyed by the lobby byte and carry one bit per
//! non-empty terminus word. The lobby layer itself is never stored.

use crate::math::bit_math::bit_after_trunc;
use alloy_primitives::U256;

/// Sentinel tick past the top of the 24-bit tick space.
pub const ZERO_TICK_UPPER: i32 = 8_388_607;
/// Sentinel tick past the bottom of the 24-bit tick space.
pub const ZERO_TICK_LOWER: i32 = -8_388_608;

/// Signed top byte of the tick.
#[inline]
pub fn lobby_key(tick: i32) -> i8 {
    (tick >> 16) as i8
}

/// Signed top 16 bits of the tick, the key of its terminus word.
#[inline]
pub fn mezz_key(tick: i32) -> i16 {
    (tick >> 8) as i16
}

/// Position of the tick's lobby inside the 256 lobby slots.
#[inline]
pub fn lobby_bit(tick: i32) -> u8 {
    cast_bitmap_index(lobby_key(tick))
}

/// Position of the tick's terminus word inside its mezzanine word.
#[inline]
pub fn mezz_bit(tick: i32) -> u8 {
    (tick >> 8) as u8
}

/// Position of the tick inside its terminus word.
#[inline]
pub fn term_bit(tick: i32) -> u8 {
    tick as u8
}

/// Maps a signed lobby key onto `0..=255` so that ordering is preserved.
#[inline]
pub fn cast_bitmap_index(x: i8) -> u8 {
    (x as u8) ^ 0x80
}

#[inline]
pub fn uncast_bitmap_index(x: u8) -> i8 {
    (x ^ 0x80) as i8
}

pub fn weld_lobby_mezz(lobby: i8, mezz: u8) -> i16 {
    (i16::from(lobby) << 8) + i16::from(mezz)
}

pub fn weld_mezz_term(mezz_base: i16, term: u8) -> i32 {
    (i32::from(mezz_base) << 8) + i32::from(term)
}

pub fn weld_lobby_mezz_term(lobby: i8, mezz: u8, term: u8) -> i32 {
    (i32::from(lobby) << 16) + (i32::from(mezz) << 8) + i32::from(term)
}

/// Same as [`weld_lobby_mezz_term`] with the lobby given as a cast bit.
pub fn weld_lobby_pos_mezz_term(lobby_pos: u8, mezz: u8, term: u8) -> i32 {
    weld_lobby_mezz_term(uncast_bitmap_index(lobby_pos), mezz, term)
}

/// Turns a directional bit index into a truncation shift: counted from the
/// right for upper searches, from the left otherwise.
#[inline]
pub fn bit_relate(bit: u8, is_upper: bool) -> u8 {
    if is_upper {
        bit
    } else {
        255 - bit
    }
}

/// Truncation shift that excludes everything at or below the tick for an
/// upper search and everything above it for a lower search. Can be 256.
#[inline]
pub fn term_bump(tick: i32, is_upper: bool) -> u16 {
    u16::from(bit_relate(term_bit(tick), is_upper)) + u16::from(is_upper)
}

#[inline]
pub fn zero_tick(is_upper: bool) -> i32 {
    if is_upper {
        ZERO_TICK_UPPER
    } else {
        ZERO_TICK_LOWER
    }
}

/// False for the two sentinels standing in for an unbounded price.
#[inline]
pub fn is_tick_finite(tick: i32) -> bool {
    tick > ZERO_TICK_LOWER && tick < ZERO_TICK_UPPER
}

/// Finds the next bump inside one terminus word.
///
/// Returns the tick of the first set bit past `shift_term` in the search
/// direction. When the word has none, returns the border of the word
/// (the first tick of the next word going up, the first tick of this word
/// going down) together with `true` to signal the spill.
pub fn pin_term_mezz(is_upper: bool, shift_term: u16, mezz: i16, term_bitmap: U256) -> (i32, bool) {
    match bit_after_trunc(term_bitmap, shift_term, is_upper) {
        Some(term) => (weld_mezz_term(mezz, term), false),
        None => (spill_over_pin(is_upper, mezz), true),
    }
}

/// Border tick of the terminus word `mezz` in the search direction.
pub fn spill_over_pin(is_upper: bool, mezz: i16) -> i32 {
    if !is_upper {
        weld_mezz_term(mezz, 0)
    } else if mezz == i16::MAX {
        zero_tick(true)
    } else {
        weld_mezz_term(mezz + 1, 0)
    }
}
