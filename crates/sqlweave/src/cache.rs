//! LRU cache keyed by compiled SQL text.
//!
//! Callers that prepare statements (or memoize anything per statement) can
//! key on [`CompiledQuery::cache_key`](crate::CompiledQuery::cache_key): two
//! drafts that compile to the same SQL share one entry regardless of their
//! parameters.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Counters for a [`StatementCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
    pub capacity: usize,
}

/// Thread-safe LRU map from SQL text to a handle.
///
/// A capacity of 0 disables caching: inserts are dropped and every lookup
/// misses.
#[derive(Debug)]
pub struct StatementCache<H> {
    inner: Mutex<CacheInner<H>>,
}

#[derive(Debug)]
struct CacheInner<H> {
    capacity: usize,
    map: HashMap<String, H>,
    order: VecDeque<String>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<H: Clone> StatementCache<H> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                capacity,
                map: HashMap::new(),
                order: VecDeque::new(),
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner<H>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up `sql`, marking it most recently used.
    pub fn get(&self, sql: &str) -> Option<H> {
        let mut inner = self.lock();
        match inner.map.get(sql).cloned() {
            Some(handle) => {
                inner.hits += 1;
                inner.touch(sql);
                Some(handle)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Insert or replace the entry for `sql`.
    pub fn set(&self, sql: String, handle: H) {
        let mut inner = self.lock();
        if inner.capacity == 0 {
            return;
        }
        if inner.map.insert(sql.clone(), handle).is_some() {
            inner.touch(&sql);
        } else {
            inner.order.push_back(sql);
            inner.evict_if_needed();
        }
    }

    /// Return the cached handle for `sql`, inserting `handle` if absent.
    pub fn insert_if_absent(&self, sql: String, handle: H) -> H {
        let mut inner = self.lock();

        if let Some(existing) = inner.map.get(&sql).cloned() {
            inner.touch(&sql);
            return existing;
        }
        if inner.capacity == 0 {
            return handle;
        }

        inner.map.insert(sql.clone(), handle.clone());
        inner.order.push_back(sql);
        inner.evict_if_needed();
        handle
    }

    pub fn remove(&self, sql: &str) -> Option<H> {
        let mut inner = self.lock();
        let removed = inner.map.remove(sql);
        if removed.is_some() {
            inner.remove_from_order(sql);
        }
        removed
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.map.clear();
        inner.order.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            size: inner.map.len(),
            capacity: inner.capacity,
        }
    }
}

impl<H> CacheInner<H> {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k.as_str() == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }

    fn remove_from_order(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k.as_str() == key) {
            let _ = self.order.remove(pos);
        }
    }

    fn evict_if_needed(&mut self) {
        while self.map.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if self.map.remove(&oldest).is_some() {
                self.evictions += 1;
                tracing::trace!(target: "sqlweave.cache", sql = %oldest, "evicted statement");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn evicts_least_recently_used() {
        let cache = StatementCache::new(2);
        cache.set("a".into(), 1);
        cache.set("b".into(), 2);
        assert_eq!(cache.get("a"), Some(1));
        cache.set("c".into(), 3);

        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("c"), Some(3));
        assert_eq!(cache.len(), 2);

        let stats = cache.stats();
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 2);
        assert_eq!(stats.capacity, 2);
    }

    #[test]
    fn set_replaces_existing_entry() {
        let cache = StatementCache::new(2);
        cache.set("a".into(), 1);
        cache.set("a".into(), 10);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a"), Some(10));
    }

    #[test]
    fn insert_if_absent_keeps_first() {
        let cache = StatementCache::new(4);
        assert_eq!(cache.insert_if_absent("q".into(), "first"), "first");
        assert_eq!(cache.insert_if_absent("q".into(), "second"), "first");
    }

    #[test]
    fn zero_capacity_disables() {
        let cache = StatementCache::new(0);
        cache.set("a".into(), 1);
        assert!(cache.is_empty());
        assert_eq!(cache.insert_if_absent("a".into(), 2), 2);
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn remove_and_clear() {
        let cache = StatementCache::new(4);
        cache.set("a".into(), 1);
        cache.set("b".into(), 2);
        assert_eq!(cache.remove("a"), Some(1));
        assert_eq!(cache.remove("a"), None);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn shared_across_threads() {
        let cache = Arc::new(StatementCache::new(64));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..16 {
                        cache.insert_if_absent(format!("q{}", i % 8), t);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 8);
    }
}
