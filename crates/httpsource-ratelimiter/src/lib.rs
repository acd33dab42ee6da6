//! Rate limiter with four interchangeable algorithms (spec §3 RateBucket, §4.5).
//!
//! All four algorithms expose the same `try_acquire` / `on_result` contract, so
//! callers (the endpoint runner) never need to know which one backs a given
//! scope. Buckets are looked up by [`Scope`] through a [`RateLimiterRegistry`]
//! that is shared, read-only, across the Task Coordinator and every runner.

mod algorithm;
mod config;
mod error;
mod events;

use algorithm::{AlgorithmState, Decision};
pub use config::{Algorithm, RateLimiterConfig, RateLimiterConfigBuilder, Scope};
pub use error::RateLimitedError;
pub use events::RateLimiterEvent;
use httpsource_core::EventListeners;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
#[cfg(feature = "metrics")]
use metrics::counter;

/// Outcome of `try_acquire`, named per spec §4.5 (`Allowed | Denied(wait_ms, reason)`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AcquireDecision {
    Allowed,
    Denied { wait: Duration, reason: &'static str },
}

/// One scoped rate limiter bucket.
pub struct RateLimiter {
    config: RateLimiterConfig,
    state: Mutex<AlgorithmState>,
    event_listeners: EventListeners<RateLimiterEvent>,
}

impl RateLimiter {
    /// Creates a standalone limiter (not registered in a [`RateLimiterRegistry`]).
    pub fn new(config: RateLimiterConfig) -> Self {
        let state = AlgorithmState::new(&config);
        Self {
            config,
            state: Mutex::new(state),
            event_listeners: EventListeners::new(),
        }
    }

    /// Registers an event listener.
    pub fn add_listener<L>(&mut self, listener: L)
    where
        L: httpsource_core::EventListener<RateLimiterEvent> + 'static,
    {
        self.event_listeners.add(listener);
    }

    /// Non-blocking acquisition attempt (spec §4.1 step 3).
    pub fn try_acquire(&self) -> AcquireDecision {
        let decision = {
            let mut state = self.state.lock().unwrap();
            state.try_acquire()
        };

        let scope_key = self.config.scope().key();
        match decision {
            Decision::Allowed => {
                self.event_listeners.emit(&RateLimiterEvent::PermitAcquired {
                    scope: scope_key.clone(),
                    timestamp: std::time::Instant::now(),
                });
                #[cfg(feature = "metrics")]
                counter!("ratelimiter_permits_total", "scope" => scope_key, "outcome" => "allowed").increment(1);
                AcquireDecision::Allowed
            }
            Decision::Denied { wait } => {
                self.event_listeners.emit(&RateLimiterEvent::PermitDenied {
                    scope: scope_key.clone(),
                    timestamp: std::time::Instant::now(),
                    wait,
                });
                #[cfg(feature = "metrics")]
                counter!("ratelimiter_permits_total", "scope" => scope_key, "outcome" => "denied").increment(1);
                AcquireDecision::Denied {
                    wait,
                    reason: "capacity_exhausted",
                }
            }
        }
    }

    /// Awaits a permit, sleeping for the wait hint if denied, then retrying once.
    /// Used by endpoint runners that want to honor backpressure instead of
    /// rescheduling (spec §5: "awaiting the rate limiter's wait hint").
    pub async fn acquire(&self) -> Result<(), RateLimitedError> {
        match self.try_acquire() {
            AcquireDecision::Allowed => Ok(()),
            AcquireDecision::Denied { wait, .. } => Err(RateLimitedError { wait }),
        }
    }

    /// Feeds back the HTTP status of the call this permit protected.
    ///
    /// On HTTP 429, bucket-mode algorithms take an extra one-shot debit
    /// (spec §4.5); window algorithms are unaffected since they already count
    /// discrete calls, not a continuous budget.
    pub fn on_result(&self, status: u16) {
        if status == 429 {
            let mut state = self.state.lock().unwrap();
            state.debit_for_rate_limit(self.config.rate_limited_penalty);
        }
    }
}

/// A shared, concurrent-safe collection of rate limiter buckets keyed by
/// [`Scope`]. Each bucket guards itself with its own mutex; the registry's own
/// lock is only held to create-or-fetch a bucket, never across an acquisition
/// (spec §5: "no global lock").
#[derive(Clone, Default)]
pub struct RateLimiterRegistry {
    buckets: Arc<Mutex<HashMap<String, Arc<RateLimiter>>>>,
}

impl RateLimiterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches the bucket for `config`'s scope, creating it on first use.
    pub fn get_or_create(&self, config: RateLimiterConfig) -> Arc<RateLimiter> {
        let key = config.scope().key();
        let mut buckets = self.buckets.lock().unwrap();
        buckets
            .entry(key)
            .or_insert_with(|| Arc::new(RateLimiter::new(config)))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(algorithm: Algorithm, scope: Scope, capacity: u64) -> RateLimiterConfig {
        RateLimiterConfig::builder(algorithm, scope)
            .capacity(capacity)
            .refill_per_second(1.0)
            .build()
    }

    #[test]
    fn try_acquire_denies_past_capacity() {
        let limiter = RateLimiter::new(config(Algorithm::TokenBucket, Scope::Global, 1));
        assert_eq!(limiter.try_acquire(), AcquireDecision::Allowed);
        assert!(matches!(
            limiter.try_acquire(),
            AcquireDecision::Denied { .. }
        ));
    }

    #[tokio::test]
    async fn acquire_returns_wait_hint_on_denial() {
        let limiter = RateLimiter::new(config(Algorithm::TokenBucket, Scope::Global, 1));
        limiter.acquire().await.unwrap();
        let err = limiter.acquire().await.unwrap_err();
        assert!(err.wait > Duration::ZERO);
    }

    #[test]
    fn registry_shares_bucket_within_same_scope() {
        let registry = RateLimiterRegistry::new();
        let a = registry.get_or_create(config(Algorithm::TokenBucket, Scope::Global, 1));
        let b = registry.get_or_create(config(Algorithm::TokenBucket, Scope::Global, 1));
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn registry_isolates_different_endpoint_scopes() {
        let registry = RateLimiterRegistry::new();
        let a = registry.get_or_create(config(
            Algorithm::TokenBucket,
            Scope::Endpoint("api1".into()),
            1,
        ));
        let b = registry.get_or_create(config(
            Algorithm::TokenBucket,
            Scope::Endpoint("api2".into()),
            1,
        ));
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn on_result_429_reduces_token_bucket_capacity() {
        let limiter = RateLimiter::new(
            RateLimiterConfig::builder(Algorithm::TokenBucket, Scope::Global)
                .capacity(5)
                .refill_per_second(0.0)
                .rate_limited_penalty(3)
                .build(),
        );
        limiter.on_result(429);
        // Three of five tokens were debited; only two acquisitions should succeed.
        assert_eq!(limiter.try_acquire(), AcquireDecision::Allowed);
        assert_eq!(limiter.try_acquire(), AcquireDecision::Allowed);
        assert!(matches!(
            limiter.try_acquire(),
            AcquireDecision::Denied { .. }
        ));
    }
}
