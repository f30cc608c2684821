//! In-memory TTL cache backed by `DashMap` for concurrent access.

use dashmap::DashMap;
use std::time::{Duration, Instant};

/// A single cached value with its expiration time.
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Thread-safe in-memory cache with time-to-live expiration.
///
/// Expired entries are lazily evicted on the next `get` call for that key.
/// The cache is owned by whoever creates it; nothing here is global.
pub struct MemoryCache<V> {
    store: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
}

impl<V: Clone> MemoryCache<V> {
    /// Creates a new cache with the given time-to-live for entries.
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
        }
    }

    /// Returns the cached value for `key`, or `None` if missing or expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.store.get(key)?;
        if Instant::now() > entry.expires_at {
            drop(entry);
            self.store.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Inserts or overwrites a cache entry. The entry expires after the configured TTL.
    /// A zero TTL disables caching.
    pub fn set(&self, key: String, value: V) {
        if self.ttl.is_zero() {
            return;
        }
        self.store.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drops the entry for `key`. Returns whether one was present.
    pub fn invalidate(&self, key: &str) -> bool {
        self.store.remove(key).is_some()
    }
}
