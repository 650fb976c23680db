//! Hash map used by the in-memory level store. The hasher is picked by cargo
//! feature: `rustc-hash` wins when enabled, then `ahash`, else std's SipHash.

#[cfg(feature = "rustc-hash")]
pub type FastMap<K, V> = rustc_hash::FxHashMap<K, V>;

#[cfg(all(feature = "ahash", not(feature = "rustc-hash")))]
pub type FastMap<K, V> = ahash::AHashMap<K, V>;

#[cfg(not(any(feature = "rustc-hash", feature = "ahash")))]
pub type FastMap<K, V> = std::collections::HashMap<K, V>;
