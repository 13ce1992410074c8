/*
 * bounded.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Capacity-bounded memoization.
//!
//! [`BoundedCache`] maps a raw key to a lazily computed value. The raw key is
//! first collapsed into a normalized key by a supplied function, so call sites
//! that describe the same logical entry in different shapes share one slot.
//! Storage is an LRU map: once the cache is full, inserting a new entry evicts
//! the least recently used one.

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::fmt;
use std::hash::Hash;

use hashlink::LruCache;

type KeyFn<K, N> = Box<dyn Fn(&K) -> N>;
type ValueFn<K, V, E> = Box<dyn Fn(&K) -> Result<V, E>>;

/// Hit/miss counters and occupancy for a single cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from storage.
    pub hits: u64,
    /// Lookups that ran the factory.
    pub misses: u64,
    /// Entries currently retained.
    pub len: usize,
    /// Maximum number of retained entries.
    pub capacity: usize,
}

/// A memoizing map from raw keys to lazily computed values.
///
/// - `K` is the raw key handed to [`BoundedCache::try_get`].
/// - `N` is the normalized key the entry is stored under.
/// - `V` is the memoized value. It is cloned out on every lookup, so it is
///   usually an `Rc` or another cheap handle; cloning an `Rc` keeps the
///   returned object identical across lookups.
/// - `E` is the factory's error type. Failed computations are never stored.
///
/// The cache is single-threaded and tolerates re-entrant use: no borrow of the
/// storage is held while the factory runs, so the factory may query this cache
/// or any other one.
pub struct BoundedCache<K, N, V, E = Infallible> {
    label: &'static str,
    entries: RefCell<LruCache<N, V>>,
    key_fn: KeyFn<K, N>,
    value_fn: ValueFn<K, V, E>,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl<K, N, V> BoundedCache<K, N, V, Infallible>
where
    K: 'static,
    N: Eq + Hash + 'static,
    V: Clone + 'static,
{
    /// Create a cache whose factory cannot fail.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(
        capacity: usize,
        key_fn: impl Fn(&K) -> N + 'static,
        value_fn: impl Fn(&K) -> V + 'static,
    ) -> Self {
        Self::fallible(capacity, key_fn, move |key: &K| Ok(value_fn(key)))
    }

    /// Look up `key`, computing and storing the value on a miss.
    pub fn get(&self, key: &K) -> V {
        match self.try_get(key) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }
}

impl<K, N, V, E> BoundedCache<K, N, V, E>
where
    N: Eq + Hash,
    V: Clone,
{
    /// Create a cache whose factory may fail.
    ///
    /// A capacity of zero is treated as one.
    pub fn fallible(
        capacity: usize,
        key_fn: impl Fn(&K) -> N + 'static,
        value_fn: impl Fn(&K) -> Result<V, E> + 'static,
    ) -> Self {
        Self {
            label: "cache",
            entries: RefCell::new(LruCache::new(capacity.max(1))),
            key_fn: Box::new(key_fn),
            value_fn: Box::new(value_fn),
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    /// Name this cache in log output.
    pub fn labeled(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    /// Look up `key`, computing and storing the value on a miss.
    ///
    /// If the factory fails, the error is returned and nothing is stored; the
    /// next lookup for the same key runs the factory again.
    pub fn try_get(&self, key: &K) -> Result<V, E> {
        let normalized = (self.key_fn)(key);

        let cached = self.entries.borrow_mut().get(&normalized).cloned();
        if let Some(value) = cached {
            self.hits.set(self.hits.get() + 1);
            tracing::trace!(cache = self.label, "cache hit");
            return Ok(value);
        }

        self.misses.set(self.misses.get() + 1);
        tracing::debug!(cache = self.label, "cache miss");

        let value = (self.value_fn)(key)?;

        let mut entries = self.entries.borrow_mut();
        // A re-entrant lookup may have filled this slot while the factory ran.
        if let Some(existing) = entries.get(&normalized) {
            return Ok(existing.clone());
        }
        entries.insert(normalized, value.clone());
        Ok(value)
    }

    /// Whether an entry for `key` is currently retained.
    ///
    /// Does not count as a use for eviction purposes.
    pub fn contains(&self, key: &K) -> bool {
        let normalized = (self.key_fn)(key);
        self.entries.borrow().peek(&normalized).is_some()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Check if no entries are retained.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Maximum number of retained entries.
    pub fn capacity(&self) -> usize {
        self.entries.borrow().capacity()
    }

    /// Drop every retained entry. Counters are kept.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// Snapshot of the hit/miss counters and occupancy.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.borrow();
        CacheStats {
            hits: self.hits.get(),
            misses: self.misses.get(),
            len: entries.len(),
            capacity: entries.capacity(),
        }
    }
}

impl<K, N, V, E> fmt::Debug for BoundedCache<K, N, V, E>
where
    N: Eq + Hash,
    V: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCache")
            .field("label", &self.label)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::OnceCell;
    use std::rc::Rc;

    fn counting_cache(capacity: usize) -> (BoundedCache<u32, u32, Rc<String>>, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let cache = BoundedCache::new(
            capacity,
            |key: &u32| *key,
            move |key: &u32| {
                counter.set(counter.get() + 1);
                Rc::new(format!("value-{key}"))
            },
        );
        (cache, calls)
    }

    #[test]
    fn test_memoizes_value_identity() {
        let (cache, calls) = counting_cache(4);

        let first = cache.get(&1);
        let second = cache.get(&1);

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_normalized_keys_share_a_slot() {
        let cache: BoundedCache<String, String, Rc<String>> = BoundedCache::new(
            8,
            |key: &String| key.to_lowercase(),
            |key: &String| Rc::new(key.clone()),
        );

        let upper = cache.get(&"Header".to_string());
        let lower = cache.get(&"header".to_string());

        assert!(Rc::ptr_eq(&upper, &lower));
        assert_eq!(*lower, "Header");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let (cache, calls) = counting_cache(2);

        cache.get(&1);
        cache.get(&2);
        // Touch 1 so that 2 becomes the eviction candidate.
        cache.get(&1);
        cache.get(&3);

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&1));
        assert!(!cache.contains(&2));
        assert!(cache.contains(&3));
        assert_eq!(calls.get(), 3);

        cache.get(&2);
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let (cache, _) = counting_cache(0);
        cache.get(&7);
        assert_eq!(cache.capacity(), 1);
        assert!(cache.contains(&7));
    }

    #[test]
    fn test_failures_are_not_stored() {
        let attempts = Rc::new(Cell::new(0));
        let counter = Rc::clone(&attempts);
        let cache: BoundedCache<u32, u32, u32, String> = BoundedCache::fallible(
            4,
            |key: &u32| *key,
            move |key: &u32| {
                counter.set(counter.get() + 1);
                if counter.get() == 1 {
                    Err(format!("first attempt for {key} fails"))
                } else {
                    Ok(key * 10)
                }
            },
        );

        assert_eq!(cache.try_get(&4), Err("first attempt for 4 fails".to_string()));
        assert!(cache.is_empty());
        assert_eq!(cache.try_get(&4), Ok(40));
        assert_eq!(cache.try_get(&4), Ok(40));
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn test_reentrant_factory() {
        let slot: Rc<OnceCell<BoundedCache<u64, u64, u64>>> = Rc::new(OnceCell::new());
        let inner = Rc::clone(&slot);
        let cache = BoundedCache::new(
            128,
            |n: &u64| *n,
            move |n: &u64| -> u64 {
                if *n < 2 {
                    *n
                } else {
                    let cache = inner.get().expect("cache installed before use");
                    cache.get(&(n - 1)) + cache.get(&(n - 2))
                }
            },
        );
        assert!(slot.set(cache).is_ok());

        let cache = slot.get().unwrap();
        assert_eq!(cache.get(&40), 102_334_155);
        assert_eq!(cache.stats().misses, 41);
    }

    #[test]
    fn test_clear_keeps_counters() {
        let (cache, calls) = counting_cache(4);
        cache.get(&1);
        cache.clear();
        assert!(cache.is_empty());
        cache.get(&1);
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.stats().misses, 2);
    }
}
