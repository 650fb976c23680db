//! Point-lookup storage behind the level book, tick census and knockout
//! ledger.
//!
//! Every read returns a value: a key that was never written reads as the
//! zero/default record, matching how an empty storage slot behaves.

use crate::pool::ambient_pool::PoolId;
use crate::pool::knockout::{KnockoutMerkle, KnockoutPivot, PivotKey};
use crate::FastMap;
use alloy_primitives::U256;
use std::hash::Hash;

/// A book level as it sits in storage, lots packed with their knockout flag.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PackedLevel {
    pub bid_lots: u128,
    pub ask_lots: u128,
    pub fee_odometer: u64,
}

impl PackedLevel {
    pub fn is_empty(&self) -> bool {
        self.bid_lots == 0 && self.ask_lots == 0
    }
}

/// Read side of the pool storage.
pub trait StoreView {
    /// Terminus word keyed by the 16-bit mezzanine key of its ticks.
    fn terminus(&self, pool: &PoolId, mezz: i16) -> U256;
    /// Mezzanine word keyed by the cast lobby bit.
    fn mezzanine(&self, pool: &PoolId, lobby: u8) -> U256;
    fn level(&self, pool: &PoolId, tick: i32) -> PackedLevel;
    fn knockout_pivot(&self, key: &PivotKey) -> KnockoutPivot;
    fn knockout_merkle(&self, key: &PivotKey) -> KnockoutMerkle;
}

/// Write side of the pool storage. Writing a default value deletes.
pub trait LevelStore: StoreView {
    fn set_terminus(&mut self, pool: &PoolId, mezz: i16, word: U256);
    fn set_mezzanine(&mut self, pool: &PoolId, lobby: u8, word: U256);
    fn set_level(&mut self, pool: &PoolId, tick: i32, level: PackedLevel);
    fn set_knockout_pivot(&mut self, key: &PivotKey, pivot: KnockoutPivot);
    fn set_knockout_merkle(&mut self, key: &PivotKey, merkle: KnockoutMerkle);
}

impl<T: StoreView + ?Sized> StoreView for &T {
    fn terminus(&self, pool: &PoolId, mezz: i16) -> U256 {
        (**self).terminus(pool, mezz)
    }

    fn mezzanine(&self, pool: &PoolId, lobby: u8) -> U256 {
        (**self).mezzanine(pool, lobby)
    }

    fn level(&self, pool: &PoolId, tick: i32) -> PackedLevel {
        (**self).level(pool, tick)
    }

    fn knockout_pivot(&self, key: &PivotKey) -> KnockoutPivot {
        (**self).knockout_pivot(key)
    }

    fn knockout_merkle(&self, key: &PivotKey) -> KnockoutMerkle {
        (**self).knockout_merkle(key)
    }
}

/// In-memory store. Keys written back to their default value are removed,
/// so the maps only ever hold live records.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    terminus: FastMap<(PoolId, i16), U256>,
    mezzanine: FastMap<(PoolId, u8), U256>,
    levels: FastMap<(PoolId, i32), PackedLevel>,
    pivots: FastMap<PivotKey, KnockoutPivot>,
    merkles: FastMap<PivotKey, KnockoutMerkle>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live book levels across all pools.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Number of active knockout pivots across all pools.
    pub fn pivot_count(&self) -> usize {
        self.pivots.len()
    }
}

fn read<K: Eq + Hash, V: Copy + Default>(map: &FastMap<K, V>, key: &K) -> V {
    map.get(key).copied().unwrap_or_default()
}

fn write<K: Eq + Hash, V: Default + PartialEq>(map: &mut FastMap<K, V>, key: K, value: V) {
    if value == V::default() {
        map.remove(&key);
    } else {
        map.insert(key, value);
    }
}

impl StoreView for MemoryStore {
    fn terminus(&self, pool: &PoolId, mezz: i16) -> U256 {
        read(&self.terminus, &(*pool, mezz))
    }

    fn mezzanine(&self, pool: &PoolId, lobby: u8) -> U256 {
        read(&self.mezzanine, &(*pool, lobby))
    }

    fn level(&self, pool: &PoolId, tick: i32) -> PackedLevel {
        read(&self.levels, &(*pool, tick))
    }

    fn knockout_pivot(&self, key: &PivotKey) -> KnockoutPivot {
        read(&self.pivots, key)
    }

    fn knockout_merkle(&self, key: &PivotKey) -> KnockoutMerkle {
        read(&self.merkles, key)
    }
}

impl LevelStore for MemoryStore {
    fn set_terminus(&mut self, pool: &PoolId, mezz: i16, word: U256) {
        write(&mut self.terminus, (*pool, mezz), word);
    }

    fn set_mezzanine(&mut self, pool: &PoolId, lobby: u8, word: U256) {
        write(&mut self.mezzanine, (*pool, lobby), word);
    }

    fn set_level(&mut self, pool: &PoolId, tick: i32, level: PackedLevel) {
        write(&mut self.levels, (*pool, tick), level);
    }

    fn set_knockout_pivot(&mut self, key: &PivotKey, pivot: KnockoutPivot) {
        write(&mut self.pivots, *key, pivot);
    }

    fn set_knockout_merkle(&mut self, key: &PivotKey, merkle: KnockoutMerkle) {
        write(&mut self.merkles, *key, merkle);
    }
}

/// Copy-on-write overlay over a read-only store.
///
/// Writes land in the overlay and shadow the base, including writes of a
/// default value. The base is never touched, so any number of scratch
/// stores can run against one shared snapshot at the same time.
#[derive(Debug)]
pub struct ScratchStore<'a, V: ?Sized> {
    base: &'a V,
    terminus: FastMap<(PoolId, i16), U256>,
    mezzanine: FastMap<(PoolId, u8), U256>,
    levels: FastMap<(PoolId, i32), PackedLevel>,
    pivots: FastMap<PivotKey, KnockoutPivot>,
    merkles: FastMap<PivotKey, KnockoutMerkle>,
}

impl<'a, V: StoreView + ?Sized> ScratchStore<'a, V> {
    pub fn new(base: &'a V) -> Self {
        Self {
            base,
            terminus: FastMap::default(),
            mezzanine: FastMap::default(),
            levels: FastMap::default(),
            pivots: FastMap::default(),
            merkles: FastMap::default(),
        }
    }

    /// Number of records shadowed so far.
    pub fn dirty_len(&self) -> usize {
        self.terminus.len()
            + self.mezzanine.len()
            + self.levels.len()
            + self.pivots.len()
            + self.merkles.len()
    }
}

impl<V: StoreView + ?Sized> StoreView for ScratchStore<'_, V> {
    fn terminus(&self, pool: &PoolId, mezz: i16) -> U256 {
        match self.terminus.get(&(*pool, mezz)) {
            Some(word) => *word,
            None => self.base.terminus(pool, mezz),
        }
    }

    fn mezzanine(&self, pool: &PoolId, lobby: u8) -> U256 {
        match self.mezzanine.get(&(*pool, lobby)) {
            Some(word) => *word,
            None => self.base.mezzanine(pool, lobby),
        }
    }

    fn level(&self, pool: &PoolId, tick: i32) -> PackedLevel {
        match self.levels.get(&(*pool, tick)) {
            Some(level) => *level,
            None => self.base.level(pool, tick),
        }
    }

    fn knockout_pivot(&self, key: &PivotKey) -> KnockoutPivot {
        match self.pivots.get(key) {
            Some(pivot) => *pivot,
            None => self.base.knockout_pivot(key),
        }
    }

    fn knockout_merkle(&self, key: &PivotKey) -> KnockoutMerkle {
        match self.merkles.get(key) {
            Some(merkle) => *merkle,
            None => self.base.knockout_merkle(key),
        }
    }
}

impl<V: StoreView + ?Sized> LevelStore for ScratchStore<'_, V> {
    fn set_terminus(&mut self, pool: &PoolId, mezz: i16, word: U256) {
        self.terminus.insert((*pool, mezz), word);
    }

    fn set_mezzanine(&mut self, pool: &PoolId, lobby: u8, word: U256) {
        self.mezzanine.insert((*pool, lobby), word);
    }

    fn set_level(&mut self, pool: &PoolId, tick: i32, level: PackedLevel) {
        self.levels.insert((*pool, tick), level);
    }

    fn set_knockout_pivot(&mut self, key: &PivotKey, pivot: KnockoutPivot) {
        self.pivots.insert(*key, pivot);
    }

    fn set_knockout_merkle(&mut self, key: &PivotKey, merkle: KnockoutMerkle) {
        self.merkles.insert(*key, merkle);
    }
}
