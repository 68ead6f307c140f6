//! Fixed-capacity LRU cache of verdicts keyed by normalized question.

use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::verdict::Verdict;

pub const DEFAULT_CAPACITY: usize = 1000;

/// Counters exposed for /stats and metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Percentage of lookups served from the cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 * 100.0 / total as f64
        }
    }
}

struct Inner {
    lru: LruCache<String, Verdict>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// One mutex guards the recency list and the counters together.
pub struct ResultCache {
    inner: Mutex<Inner>,
}

impl ResultCache {
    /// A zero capacity is raised to one; config validation rejects zero first.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                lru: LruCache::new(capacity),
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        }
    }

    // A panic while holding the lock cannot leave the LRU half-updated, so a
    // poisoned guard is still usable.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Look up and mark as most recently used.
    pub fn get(&self, key: &str) -> Option<Verdict> {
        let mut inner = self.lock();
        match inner.lru.get(key).cloned() {
            Some(verdict) => {
                inner.hits += 1;
                Some(verdict)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Insert, evicting the least recently used entry when full.
    pub fn put(&self, key: String, verdict: Verdict) {
        let mut inner = self.lock();
        let full = !inner.lru.contains(&key) && inner.lru.len() == inner.lru.cap().get();
        if full {
            inner.evictions += 1;
            if let Some((oldest, _)) = inner.lru.peek_lru() {
                debug!("Verdict cache full, evicting '{}'", oldest);
            }
        }
        inner.lru.put(key, verdict);
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        self.lock().lru.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().lru.contains(key)
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            size: inner.lru.len(),
            capacity: inner.lru.cap().get(),
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
