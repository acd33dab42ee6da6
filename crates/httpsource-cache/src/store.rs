use crate::fingerprint::Fingerprint;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// A cached response (spec §3 CacheEntry).
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub ttl: Duration,
    cached_at: Instant,
}

impl CachedResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Vec<u8>, ttl: Duration) -> Self {
        Self {
            status,
            headers,
            body,
            ttl,
            cached_at: Instant::now(),
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.cached_at) > self.ttl
    }

    pub fn cached_at(&self) -> Instant {
        self.cached_at
    }
}

/// LRU store with proactive eviction at 90% occupancy (spec §4.6).
pub(crate) struct CacheStore {
    cache: LruCache<Fingerprint, CachedResponse>,
    capacity: usize,
}

impl CacheStore {
    pub(crate) fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            cache: LruCache::new(cap),
            capacity,
        }
    }

    /// Returns the entry if present and not TTL-expired, evicting it otherwise.
    pub(crate) fn get(&mut self, key: &Fingerprint) -> Option<CachedResponse> {
        let now = Instant::now();
        let expired = matches!(self.cache.peek(key), Some(entry) if entry.is_expired(now));
        if expired {
            self.cache.pop(key);
            return None;
        }
        self.cache.get(key).cloned()
    }

    /// Inserts an entry, proactively evicting the least-recently-accessed 10%
    /// once occupancy reaches 90% of capacity, ahead of the natural
    /// one-for-one eviction `LruCache` would otherwise perform at 100%.
    pub(crate) fn insert(&mut self, key: Fingerprint, value: CachedResponse) {
        let occupancy_threshold = (self.capacity * 9) / 10;
        if self.cache.len() >= occupancy_threshold.max(1) && !self.cache.contains(&key) {
            let to_evict = ((self.capacity / 10).max(1)).min(self.cache.len());
            for _ in 0..to_evict {
                if self.cache.pop_lru().is_none() {
                    break;
                }
            }
        }
        self.cache.put(key, value);
    }

    /// Sweeps all TTL-expired entries (the background sweeper's job).
    pub(crate) fn sweep_expired(&mut self) -> usize {
        let now = Instant::now();
        let expired_keys: Vec<Fingerprint> = self
            .cache
            .iter()
            .filter(|(_, v)| v.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        let count = expired_keys.len();
        for key in expired_keys {
            self.cache.pop(&key);
        }
        count
    }

    pub(crate) fn len(&self) -> usize {
        self.cache.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }
}
