//! Hash-keyed deduplication caches.
//!
//! All the expensive native objects (pipelines, descriptor-set layouts,
//! pipeline layouts, buffer views) are created at most once per distinct
//! content hash. The read path takes a shared lock only; insertion takes
//! the exclusive lock and re-checks, so concurrent first requests for the
//! same hash still yield exactly one stored object.

use std::sync::RwLock;

use fnv::FnvHashMap;

use crate::GfxResult;

pub(crate) struct DedupCache<T: Clone> {
    map: RwLock<FnvHashMap<u64, T>>,
}

impl<T: Clone> Default for DedupCache<T> {
    fn default() -> Self {
        Self {
            map: RwLock::new(FnvHashMap::default()),
        }
    }
}

impl<T: Clone> DedupCache<T> {
    /// Shared-lock lookup.
    pub fn get(&self, hash: u64) -> Option<T> {
        self.map.read().unwrap().get(&hash).cloned()
    }

    /// Returns the cached value for `hash`, creating it under the exclusive
    /// lock if missing. The double check after lock acquisition guarantees
    /// `create` runs at most once per hash even under contention.
    pub fn get_or_create(&self, hash: u64, create: impl FnOnce() -> GfxResult<T>) -> GfxResult<T> {
        if let Some(value) = self.get(hash) {
            return Ok(value);
        }

        let mut map = self.map.write().unwrap();
        if let Some(value) = map.get(&hash) {
            return Ok(value.clone());
        }

        let value = create()?;
        map.insert(hash, value.clone());
        Ok(value)
    }

    /// Inserts a value that was created outside the lock. If another thread
    /// won the race, the stored value is returned and the caller's loser
    /// value comes back for destruction.
    ///
    /// This is the pipeline-factory flavor: pipeline creation is too slow to
    /// serialize, so threads build speculatively and the first insert wins.
    pub fn insert_or_discard(&self, hash: u64, value: T) -> (T, Option<T>) {
        let mut map = self.map.write().unwrap();
        if let Some(existing) = map.get(&hash) {
            (existing.clone(), Some(value))
        } else {
            map.insert(hash, value.clone());
            (value, None)
        }
    }

    /// Drains the cache for teardown.
    pub fn drain(&self) -> Vec<T> {
        let mut map = self.map.write().unwrap();
        map.drain().map(|(_, value)| value).collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.map.read().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn at_most_one_creation_per_hash() {
        let cache = DedupCache::<u64>::default();
        let creations = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..16 {
                scope.spawn(|| {
                    let value = cache
                        .get_or_create(0xABCD, || {
                            creations.fetch_add(1, Ordering::SeqCst);
                            Ok(77)
                        })
                        .unwrap();
                    assert_eq!(value, 77);
                });
            }
        });

        assert_eq!(creations.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn create_errors_are_not_cached() {
        let cache = DedupCache::<u64>::default();
        assert!(cache.get_or_create(1, || Err("nope".into())).is_err());
        assert_eq!(cache.get_or_create(1, || Ok(5)).unwrap(), 5);
    }

    #[test]
    fn speculative_insert_keeps_the_first_value() {
        let cache = DedupCache::<u64>::default();
        let (kept, discarded) = cache.insert_or_discard(9, 100);
        assert_eq!((kept, discarded), (100, None));

        let (kept, discarded) = cache.insert_or_discard(9, 200);
        assert_eq!(kept, 100);
        assert_eq!(discarded, Some(200));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_hashes_create_distinct_objects() {
        let cache = DedupCache::<u64>::default();
        let counter = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for hash in 0..8u64 {
                let counter = &counter;
                let cache = &cache;
                scope.spawn(move || {
                    cache
                        .get_or_create(hash, || {
                            counter.fetch_add(1, Ordering::SeqCst);
                            Ok(hash * 2)
                        })
                        .unwrap();
                });
            }
        });

        assert_eq!(counter.load(Ordering::SeqCst), 8);
        assert_eq!(cache.len(), 8);
    }
}
