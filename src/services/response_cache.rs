//! Bounded TTL cache for shaped upstream responses.
//!
//! # Semantics
//!
//! - **Freshness**: an entry satisfies a lookup only while
//!   `now - inserted_at < ttl`. Expired entries are dropped lazily when they
//!   are next looked up; there is no background purge.
//! - **Capacity**: the cache never holds more than `max_entries` values.
//!   Storing a new key into a full cache evicts the oldest-inserted key,
//!   whether or not it has expired.
//! - **FIFO, not LRU**: lookups never change eviction order.
//! - **Overwrite**: storing an existing key refreshes its value and timestamp
//!   in place and does not take a new slot or move it in the eviction order.
//!
//! Keys form one flat namespace shared by all clients.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::trace;

/// A cached value with its insertion time.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    /// Whether this entry may still be served at `now`.
    pub fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) < ttl
    }
}

#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Keys in insertion order; always the same set as `entries`.
    order: VecDeque<String>,
}

impl<V> Inner<V> {
    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
        }
    }
}

/// Thread-safe bounded cache with TTL expiry and FIFO eviction.
#[derive(Debug)]
pub struct ResponseCache<V> {
    ttl: Duration,
    max_entries: usize,
    inner: Mutex<Inner<V>>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries,
            inner: Mutex::new(Inner {
                entries: HashMap::with_capacity(max_entries),
                order: VecDeque::with_capacity(max_entries),
            }),
        }
    }

    /// Fetch a fresh value for `key`, if any.
    pub fn lookup(&self, key: &str) -> Option<V> {
        self.lookup_at(key, Instant::now())
    }

    /// [`lookup`](Self::lookup) against an explicit clock reading.
    pub fn lookup_at(&self, key: &str, now: Instant) -> Option<V> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        match inner.entries.get(key) {
            Some(entry) if entry.is_fresh(self.ttl, now) => Some(entry.value.clone()),
            Some(_) => {
                trace!(key, "Dropping expired cache entry");
                inner.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert or refresh `key`.
    pub fn store(&self, key: impl Into<String>, value: V) {
        self.store_at(key, value, Instant::now());
    }

    /// [`store`](Self::store) against an explicit clock reading.
    pub fn store_at(&self, key: impl Into<String>, value: V, now: Instant) {
        let key = key.into();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = inner.entries.get_mut(&key) {
            entry.value = value;
            entry.inserted_at = now;
            return;
        }

        if inner.entries.len() >= self.max_entries
            && let Some(oldest) = inner.order.pop_front()
        {
            trace!(key = %oldest, "Evicting oldest cache entry");
            inner.entries.remove(&oldest);
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
            },
        );
    }

    /// Number of physically stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }
}
