//! Storage-backed tick census: which ticks carry a book level.
//!
//! Lookups go from cheap to expensive. [`pin_bitmap`] reads the single
//! terminus word around the current tick. When that word runs out,
//! [`seek_mezz_spill`] looks at the neighbouring terminus word, then the
//! rest of the mezzanine word, and finally walks the lobby bytes one at a
//! time. The walk is bounded by the 256 lobby slots.

use crate::math::bit_math::bit_after_trunc;
use crate::math::tick_bitmap::{
    bit_relate, lobby_bit, mezz_bit, mezz_key, pin_term_mezz, term_bit, term_bump,
    uncast_bitmap_index, weld_lobby_mezz, weld_lobby_pos_mezz_term, zero_tick,
};
use crate::pool::ambient_pool::PoolId;
use crate::pool::store::{LevelStore, StoreView};
use alloy_primitives::U256;

/// Registers `tick` in the terminus and mezzanine layers.
pub fn bookmark_tick<S: LevelStore + ?Sized>(store: &mut S, pool: &PoolId, tick: i32) {
    let lobby = lobby_bit(tick);
    let mezz = mezz_bit(tick);
    let mezz_word = store.mezzanine(pool, lobby) | bit_mask(mezz);
    store.set_mezzanine(pool, lobby, mezz_word);

    let term_key = mezz_key(tick);
    let term_word = store.terminus(pool, term_key) | bit_mask(term_bit(tick));
    store.set_terminus(pool, term_key, term_word);
}

/// Removes `tick` from the census. The mezzanine bit is only cleared once
/// the whole terminus word is empty.
pub fn forget_tick<S: LevelStore + ?Sized>(store: &mut S, pool: &PoolId, tick: i32) {
    let term_key = mezz_key(tick);
    let term_word = store.terminus(pool, term_key) & !bit_mask(term_bit(tick));
    store.set_terminus(pool, term_key, term_word);

    if term_word.is_zero() {
        let lobby = lobby_bit(tick);
        let mezz_word = store.mezzanine(pool, lobby) & !bit_mask(mezz_bit(tick));
        store.set_mezzanine(pool, lobby, mezz_word);
    }
}

/// Next bump tick inside the terminus word holding `start_tick`.
///
/// An upper search returns the first bookmarked tick strictly above the
/// start, the tick the price will enter. A lower search returns the first
/// bookmarked tick at or below the start, the tick the price will exit.
/// `true` in the second slot means the word was exhausted and the returned
/// tick is only the word border.
pub fn pin_bitmap<S: StoreView + ?Sized>(
    store: &S,
    pool: &PoolId,
    is_upper: bool,
    start_tick: i32,
) -> (i32, bool) {
    let tick_mezz = mezz_key(start_tick);
    let term_bitmap = store.terminus(pool, tick_mezz);
    let shift_term = term_bump(start_tick, is_upper);
    pin_term_mezz(is_upper, shift_term, tick_mezz, term_bitmap)
}

/// First bookmarked tick past a spilled word border, or the domain sentinel
/// for the search direction when the census has nothing further.
pub fn seek_mezz_spill<S: StoreView + ?Sized>(
    store: &S,
    pool: &PoolId,
    border_tick: i32,
    is_upper: bool,
) -> i32 {
    // A lower border is the first tick of the word just searched, so the
    // seek starts one tick below it.
    let pin_tick = if is_upper { border_tick } else { border_tick - 1 };
    let lobby_border = lobby_bit(pin_tick);
    let mezz_border = mezz_bit(pin_tick);

    if let Some(tick) = seek_at_term(store, pool, lobby_border, mezz_border, is_upper) {
        return tick;
    }
    if let Some(tick) = seek_at_mezz(store, pool, lobby_border, mezz_border, is_upper) {
        return tick;
    }
    seek_over_lobby(store, pool, lobby_border, is_upper)
}

fn seek_at_term<S: StoreView + ?Sized>(
    store: &S,
    pool: &PoolId,
    lobby: u8,
    mezz: u8,
    is_upper: bool,
) -> Option<i32> {
    let term_key = weld_lobby_mezz(uncast_bitmap_index(lobby), mezz);
    let term = bit_after_trunc(store.terminus(pool, term_key), 0, is_upper)?;
    Some(weld_lobby_pos_mezz_term(lobby, mezz, term))
}

fn seek_at_mezz<S: StoreView + ?Sized>(
    store: &S,
    pool: &PoolId,
    lobby: u8,
    mezz_border: u8,
    is_upper: bool,
) -> Option<i32> {
    let shift = u16::from(bit_relate(mezz_border, is_upper));
    let mezz = bit_after_trunc(store.mezzanine(pool, lobby), shift, is_upper)?;
    seek_at_term(store, pool, lobby, mezz, is_upper)
}

fn seek_over_lobby<S: StoreView + ?Sized>(
    store: &S,
    pool: &PoolId,
    lobby_border: u8,
    is_upper: bool,
) -> i32 {
    if is_upper {
        for lobby in (u16::from(lobby_border) + 1)..=u16::from(u8::MAX) {
            if let Some(tick) = seek_at_mezz(store, pool, lobby as u8, 0, true) {
                return tick;
            }
        }
    } else {
        for lobby in (0..lobby_border).rev() {
            if let Some(tick) = seek_at_mezz(store, pool, lobby, u8::MAX, false) {
                return tick;
            }
        }
    }
    zero_tick(is_upper)
}

#[inline]
fn bit_mask(pos: u8) -> U256 {
    U256::ONE << pos as usize
}
