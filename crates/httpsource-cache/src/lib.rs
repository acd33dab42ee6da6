//! Fingerprint/fetch cache (spec §3 CacheEntry, §4.6).
//!
//! Keys are a [`Fingerprint`] of method + URL + sorted query params + a fixed
//! set of cache-relevant headers. Entries are evicted on TTL expiry (a
//! background sweeper, spawned with [`FetchCache::spawn_sweeper`]) or when
//! occupancy reaches 90% of capacity (evicting the least-recently-used 10% on
//! insert, handled inline by [`store::CacheStore`]).

mod config;
mod eligibility;
mod error;
mod events;
mod fingerprint;
mod store;
mod sweeper;

pub use config::{CacheConfig, CacheConfigBuilder};
pub use eligibility::{evaluate, Eligibility};
pub use error::CacheError;
pub use events::CacheEvent;
pub use fingerprint::Fingerprint;
pub use store::CachedResponse;
pub use sweeper::SweeperHandle;

use httpsource_core::EventListeners;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use store::CacheStore;

/// The fingerprint/fetch cache. Shared, read-only (from the caller's point of
/// view), across every endpoint runner of a task.
pub struct FetchCache {
    config: CacheConfig,
    store: Mutex<CacheStore>,
    event_listeners: EventListeners<CacheEvent>,
}

impl FetchCache {
    pub fn new(config: CacheConfig) -> Arc<Self> {
        let store = Mutex::new(CacheStore::new(config.capacity()));
        Arc::new(Self {
            config,
            store,
            event_listeners: EventListeners::new(),
        })
    }

    /// Looks up a previously observed response. A miss includes both "never
    /// seen" and "TTL expired".
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<CachedResponse> {
        let mut store = self.store.lock().unwrap();
        let result = store.get(fingerprint);
        let event = if result.is_some() {
            CacheEvent::Hit {
                key: fingerprint.as_str().to_string(),
                timestamp: Instant::now(),
            }
        } else {
            CacheEvent::Miss {
                key: fingerprint.as_str().to_string(),
                timestamp: Instant::now(),
            }
        };
        self.event_listeners.emit(&event);

        #[cfg(feature = "metrics")]
        counter!("cache_lookups_total", "outcome" => if result.is_some() { "hit" } else { "miss" }).increment(1);

        result
    }

    /// Stores a response if it satisfies the cacheability rules of spec §4.6.
    /// Returns `true` if the response was actually stored.
    pub fn put(
        &self,
        fingerprint: Fingerprint,
        status: u16,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
        cache_control: Option<&str>,
    ) -> bool {
        match evaluate(status, cache_control, body.len(), self.config.max_body_bytes) {
            Eligibility::NotCacheable => false,
            Eligibility::Cacheable { ttl_override } => {
                let ttl = ttl_override.unwrap_or(self.config.default_ttl);
                let mut store = self.store.lock().unwrap();
                store.insert(fingerprint, CachedResponse::new(status, headers, body, ttl));
                #[cfg(feature = "metrics")]
                gauge!("cache_entries").set(store.len() as f64);
                true
            }
        }
    }

    /// Removes all TTL-expired entries; invoked by the background sweeper.
    pub fn sweep_expired(&self) -> usize {
        let mut store = self.store.lock().unwrap();
        let evicted = store.sweep_expired();
        for _ in 0..evicted {
            self.event_listeners.emit(&CacheEvent::Evicted {
                key: String::new(),
                timestamp: Instant::now(),
            });
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.store.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sweep_interval(&self) -> Duration {
        self.config.sweep_interval
    }

    /// Spawns the background TTL sweeper on the current Tokio runtime.
    /// Dropping the returned handle (or calling [`SweeperHandle::stop`])
    /// cancels it, satisfying the hierarchical-cancellation requirement of
    /// spec §5 ("every acquired resource has a release path on every exit").
    pub fn spawn_sweeper(self: &Arc<Self>) -> SweeperHandle {
        sweeper::spawn(self.clone())
    }
}
