use std::time::Duration;

/// Configuration for a [`crate::FetchCache`].
///
/// Corresponds to `response.caching.enabled`, `response.cache.ttl.ms` and
/// `max.cache.size` in the task's configuration surface.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub(crate) capacity: usize,
    pub(crate) default_ttl: Duration,
    pub(crate) max_body_bytes: usize,
    pub(crate) sweep_interval: Duration,
}

impl CacheConfig {
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder {
            capacity: 1000,
            default_ttl: Duration::from_secs(300),
            max_body_bytes: 1024 * 1024,
            sweep_interval: Duration::from_secs(30),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfigBuilder {
    capacity: usize,
    default_ttl: Duration,
    max_body_bytes: usize,
    sweep_interval: Duration,
}

impl CacheConfigBuilder {
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Entries with a body larger than this are never cached (spec §4.6: 1 MiB).
    pub fn max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }

    /// Cadence of the background TTL sweeper (spec §5).
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn build(self) -> CacheConfig {
        CacheConfig {
            capacity: self.capacity,
            default_ttl: self.default_ttl,
            max_body_bytes: self.max_body_bytes,
            sweep_interval: self.sweep_interval,
        }
    }
}
