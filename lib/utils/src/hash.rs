pub use ahash::AHasher;
pub use ahash::RandomState;

/// A hasher builder that will create a fixed hasher.
///
/// Content-addressed caches need hashes that are stable for the lifetime of
/// the process, independent of any per-process random seed.
#[derive(Default)]
pub struct FixedState;

impl std::hash::BuildHasher for FixedState {
    type Hasher = AHasher;

    #[inline]
    fn build_hasher(&self) -> AHasher {
        AHasher::new_with_keys(
            0b1001_0101_1110_1110_0000_0100_1100_0100_0000_0011_0010_0110_1011_0010_0111_1000,
            0b1100_1111_0110_1011_0111_1000_1011_0101_0000_0100_0011_1110_0011_0100_1101_0101,
        )
    }
}

/// A std hash map using `AHash`, a fast non-cryptographic hash.
pub type HashMap<K, V> = std::collections::HashMap<K, V, RandomState>;

/// A std hash map with a fixed seed; iteration order depends only on
/// insertions and deletions.
pub type StableHashMap<K, V> = std::collections::HashMap<K, V, FixedState>;

/// A std hash set using `AHash`.
pub type HashSet<K> = std::collections::HashSet<K, RandomState>;
