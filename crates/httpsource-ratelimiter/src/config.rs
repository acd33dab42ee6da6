use std::time::Duration;

/// Which of the four interchangeable algorithms backs a [`crate::RateLimiter`]
/// (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Continuous refill up to a capacity; bursty up to capacity, then smooth.
    TokenBucket,
    /// Continuous drain at a fixed rate; smooths bursts into a steady outflow.
    LeakyBucket,
    /// A fixed number of permits per wall-clock-aligned window.
    FixedWindow,
    /// A fixed number of permits per rolling window of the given size.
    SlidingWindow,
}

/// The scope a bucket is keyed by (spec §3 RateBucket: "scope key").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// One bucket shared by the whole task.
    Global,
    /// One bucket per endpoint id.
    Endpoint(String),
    /// One bucket per task instance (effectively a singleton within a task).
    Task,
}

impl Scope {
    pub(crate) fn key(&self) -> String {
        match self {
            Scope::Global => "global".to_string(),
            Scope::Endpoint(id) => format!("endpoint:{id}"),
            Scope::Task => "task".to_string(),
        }
    }
}

/// Configuration for one rate limiter bucket.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    pub(crate) algorithm: Algorithm,
    pub(crate) scope: Scope,
    pub(crate) capacity: u64,
    pub(crate) refill_per_second: f64,
    pub(crate) window: Duration,
    /// Tokens debited in a single shot on an observed HTTP 429 (bucket modes only).
    pub(crate) rate_limited_penalty: u64,
}

impl RateLimiterConfig {
    /// Starts a builder for the given algorithm and scope.
    pub fn builder(algorithm: Algorithm, scope: Scope) -> RateLimiterConfigBuilder {
        RateLimiterConfigBuilder {
            algorithm,
            scope,
            capacity: 10,
            refill_per_second: 10.0,
            window: Duration::from_secs(1),
            rate_limited_penalty: 0,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}

/// Builder for [`RateLimiterConfig`].
#[derive(Debug, Clone)]
pub struct RateLimiterConfigBuilder {
    algorithm: Algorithm,
    scope: Scope,
    capacity: u64,
    refill_per_second: f64,
    window: Duration,
    rate_limited_penalty: u64,
}

impl RateLimiterConfigBuilder {
    /// Bucket capacity / permits-per-window.
    pub fn capacity(mut self, capacity: u64) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Refill/drain rate in permits per second (token/leaky bucket only).
    pub fn refill_per_second(mut self, rate: f64) -> Self {
        self.refill_per_second = rate.max(0.0);
        self
    }

    /// Window size (fixed/sliding window only).
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Tokens to debit in one shot when an HTTP 429 is observed (bucket modes).
    pub fn rate_limited_penalty(mut self, penalty: u64) -> Self {
        self.rate_limited_penalty = penalty;
        self
    }

    pub fn build(self) -> RateLimiterConfig {
        RateLimiterConfig {
            algorithm: self.algorithm,
            scope: self.scope,
            capacity: self.capacity,
            refill_per_second: self.refill_per_second,
            window: self.window,
            rate_limited_penalty: self.rate_limited_penalty,
        }
    }
}
