#[cfg(feature = "std-hash")]
pub type BuildHasher = std::collections::hash_map::RandomState;

#[cfg(not(feature = "std-hash"))]
pub type BuildHasher = ahash::RandomState;

#[cfg(feature = "std-hash")]
pub type HashMap<K, V> = std::collections::HashMap<K, V, BuildHasher>;

#[cfg(not(feature = "std-hash"))]
pub type HashMap<K, V> = hashbrown::HashMap<K, V, BuildHasher>;

/// Empty map sized for `capacity` entries using whichever hasher is active.
#[inline]
pub fn map_with_capacity<K, V>(capacity: usize) -> HashMap<K, V> {
    HashMap::with_capacity_and_hasher(capacity, BuildHasher::default())
}
