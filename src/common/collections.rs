//! Hash collections keyed by server handles, using the Fx hasher.

pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;
