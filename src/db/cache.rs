//! In-process cache for label lookups by slug.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use crate::search::store::Label;

/// Number of slug sets kept when no capacity is given.
pub const DEFAULT_CAPACITY: usize = 1000;

struct Entry {
    labels: Vec<Label>,
    expires: Instant,
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Remembers found labels for `ttl` and unknown slugs for a third of it, so
/// new labels become searchable quickly. Holds at most `capacity` slug sets,
/// evicting the least recently used one.
pub struct LabelCache {
    ttl: Duration,
    miss_ttl: Duration,
    entries: Mutex<LruCache<String, Entry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LabelCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            miss_ttl: ttl / 3,
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<Label>> {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        match entries.get(key).filter(|e| e.expires > now).map(|e| e.labels.clone()) {
            Some(labels) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(labels)
            }
            None => {
                entries.pop(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn put(&self, key: &str, labels: Vec<Label>) {
        if self.ttl.is_zero() {
            return;
        }
        let now = Instant::now();
        let ttl = if labels.is_empty() { self.miss_ttl } else { self.ttl };
        let mut entries = self.entries.lock();
        while entries.peek_lru().is_some_and(|(_, e)| e.expires <= now) {
            entries.pop_lru();
        }
        entries.put(key.to_string(), Entry { labels, expires: now + ttl });
    }

    /// Cached labels for `key`, loading and storing them on a miss.
    /// Load errors are returned and not cached.
    pub fn get_or_load(&self, key: &str, load: impl FnOnce() -> anyhow::Result<Vec<Label>>) -> anyhow::Result<Vec<Label>> {
        if let Some(labels) = self.get(key) {
            return Ok(labels);
        }
        let labels = load()?;
        self.put(key, labels.clone());
        Ok(labels)
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats { hits: self.hits.load(Ordering::Relaxed), misses: self.misses.load(Ordering::Relaxed) }
    }
}

/// Cache key for a lookup `kind` over a set of slugs, independent of their order.
pub fn key(kind: &str, slugs: &[String]) -> String {
    let mut sorted: Vec<&str> = slugs.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();
    format!("{}:{}", kind, sorted.join("|"))
}
