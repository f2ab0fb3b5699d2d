//! Bounded result cache used by every dispatch lookup.
//!
//! Entries are evicted least-recently-used once the cache reaches its
//! maximum size. An evicted entry is simply recomputed on the next miss, so
//! eviction only ever costs latency.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Sizing of a [`ResultCache`], parsed from `key=value` pairs.
///
/// ```
/// use glang_runtime::cache::CacheSpec;
///
/// let spec = CacheSpec::parse("initialCapacity=4,maximumSize=64,softValues").unwrap();
/// assert_eq!(spec.initial_capacity, 4);
/// assert_eq!(spec.maximum_size, Some(64));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheSpec {
    pub initial_capacity: usize,
    /// `None` means unbounded.
    pub maximum_size: Option<usize>,
}

/// A cache spec that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid cache spec '{spec}': {reason}")]
pub struct CacheSpecError {
    pub spec: String,
    pub reason: String,
}

impl CacheSpec {
    pub const fn new(initial_capacity: usize, maximum_size: usize) -> Self {
        Self {
            initial_capacity,
            maximum_size: Some(maximum_size),
        }
    }

    /// Parse a comma separated spec.
    ///
    /// Reference strength flags (`softValues`, `weakValues`, `weakKeys`) and
    /// unknown keys are accepted and ignored.
    pub fn parse(spec: &str) -> Result<Self, CacheSpecError> {
        let mut result = CacheSpec::default();
        for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = match part.split_once('=') {
                Some((key, value)) => (key.trim(), Some(value.trim())),
                None => (part, None),
            };
            let number = |value: Option<&str>| -> Result<usize, CacheSpecError> {
                let value = value.ok_or_else(|| CacheSpecError {
                    spec: spec.to_string(),
                    reason: format!("{key} requires a value"),
                })?;
                value.parse().map_err(|_| CacheSpecError {
                    spec: spec.to_string(),
                    reason: format!("{key} is not a number: {value}"),
                })
            };
            match key {
                "initialCapacity" => result.initial_capacity = number(value)?,
                "maximumSize" => result.maximum_size = Some(number(value)?),
                _ => {}
            }
        }
        Ok(result)
    }
}

impl fmt::Display for CacheSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "initialCapacity={}", self.initial_capacity)?;
        if let Some(max) = self.maximum_size {
            write!(f, ",maximumSize={max}")?;
        }
        Ok(())
    }
}

/// Hit/miss counters of a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

struct Entry<V> {
    value: V,
    last_access: AtomicU64,
}

/// Concurrent memoization table with LRU eviction.
pub struct ResultCache<K, V> {
    entries: RwLock<FxHashMap<K, Entry<V>>>,
    maximum_size: Option<usize>,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<K, V> ResultCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(spec: CacheSpec) -> Self {
        let mut entries = FxHashMap::default();
        entries.reserve(spec.initial_capacity);
        Self {
            entries: RwLock::new(entries),
            maximum_size: spec.maximum_size,
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Look up a cached value, refreshing its recency.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        entry.last_access.store(self.tick(), Ordering::Relaxed);
        Some(entry.value.clone())
    }

    /// Insert a value, evicting the least recently used entry when full.
    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.write();
        if let Some(max) = self.maximum_size {
            if max == 0 {
                return;
            }
            while entries.len() >= max && !entries.contains_key(&key) {
                let Some(oldest) = entries
                    .iter()
                    .min_by_key(|(_, e)| e.last_access.load(Ordering::Relaxed))
                    .map(|(k, _)| k.clone())
                else {
                    break;
                };
                entries.remove(&oldest);
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
        let last_access = AtomicU64::new(self.tick());
        entries.insert(key, Entry { value, last_access });
    }

    /// Return the cached value for `key`, computing and caching it on a miss.
    ///
    /// The computation runs without holding the lock; two threads racing on
    /// the same key may both compute, and the later insert wins.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = compute()?;
        self.insert(key.clone(), value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

impl<K, V> fmt::Debug for ResultCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCache")
            .field("len", &self.entries.read().len())
            .field("maximum_size", &self.maximum_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[test]
    fn parse_spec() {
        let spec = CacheSpec::parse("initialCapacity=16,maximumSize=256").unwrap();
        assert_eq!(spec, CacheSpec::new(16, 256));
        assert_eq!(spec.to_string(), "initialCapacity=16,maximumSize=256");
    }

    #[test]
    fn parse_spec_ignores_reference_flags() {
        let spec = CacheSpec::parse("softValues").unwrap();
        assert_eq!(spec.maximum_size, None);
        assert!(CacheSpec::parse("weakKeys, maximumSize = 3").is_ok());
    }

    #[test]
    fn parse_spec_rejects_bad_numbers() {
        let err = CacheSpec::parse("maximumSize=lots").unwrap_err();
        assert!(err.reason.contains("maximumSize"));
        assert!(CacheSpec::parse("initialCapacity").is_err());
    }

    #[test]
    fn computes_once_per_key() {
        let cache: ResultCache<&str, u32> = ResultCache::new(CacheSpec::new(4, 8));
        let mut calls = 0;
        for _ in 0..3 {
            let value = cache
                .get_or_try_insert_with(&"a", || {
                    calls += 1;
                    Ok::<_, Infallible>(7)
                })
                .unwrap();
            assert_eq!(value, 7);
        }
        assert_eq!(calls, 1);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (2, 1));
    }

    #[test]
    fn errors_are_not_cached() {
        let cache: ResultCache<u8, u8> = ResultCache::new(CacheSpec::default());
        assert!(cache.get_or_try_insert_with(&1, || Err("nope")).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache: ResultCache<u8, u8> = ResultCache::new(CacheSpec::new(2, 2));
        cache.insert(1, 10);
        cache.insert(2, 20);
        assert_eq!(cache.get(&1), Some(10));
        cache.insert(3, 30);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.get(&1), Some(10));
        assert_eq!(cache.get(&3), Some(30));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn zero_size_caches_nothing() {
        let cache: ResultCache<u8, u8> = ResultCache::new(CacheSpec::new(0, 0));
        cache.insert(1, 1);
        assert!(cache.is_empty());
    }
}
