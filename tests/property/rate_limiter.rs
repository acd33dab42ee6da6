//! Property tests for the rate limiter.
//!
//! Invariant tested (§8): over any interval with refill disabled, allowed
//! decisions never exceed the bucket's capacity; denied decisions never
//! admit a burst beyond it. `refill_per_second: 0.0` removes wall-clock
//! non-determinism so capacity is the only variable under test.

use httpsource_ratelimiter::{Algorithm, RateLimiterConfig, RateLimiterRegistry, Scope};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn token_bucket_never_admits_more_than_capacity(capacity in 1u64..=50, attempts in 0usize..200) {
        let limiter = RateLimiterRegistry::new().get_or_create(
            RateLimiterConfig::builder(Algorithm::TokenBucket, Scope::Global)
                .capacity(capacity)
                .refill_per_second(0.0)
                .build(),
        );

        let mut allowed = 0u64;
        for _ in 0..attempts {
            if limiter.try_acquire() == httpsource_ratelimiter::AcquireDecision::Allowed {
                allowed += 1;
            }
        }
        prop_assert!(allowed <= capacity);
    }

    #[test]
    fn sliding_window_never_admits_more_than_capacity_within_the_window(
        capacity in 1u64..=50,
        attempts in 0usize..200,
    ) {
        let limiter = RateLimiterRegistry::new().get_or_create(
            RateLimiterConfig::builder(Algorithm::SlidingWindow, Scope::Global)
                .capacity(capacity)
                .window(std::time::Duration::from_secs(3600))
                .build(),
        );

        let mut allowed = 0u64;
        for _ in 0..attempts {
            if limiter.try_acquire() == httpsource_ratelimiter::AcquireDecision::Allowed {
                allowed += 1;
            }
        }
        prop_assert!(allowed <= capacity);
    }

    #[test]
    fn registry_scope_key_determines_sharing(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
        let registry = RateLimiterRegistry::new();
        let config = |scope: Scope| {
            RateLimiterConfig::builder(Algorithm::TokenBucket, scope)
                .capacity(10)
                .refill_per_second(0.0)
                .build()
        };
        let first = registry.get_or_create(config(Scope::Endpoint(a.clone())));
        let second = registry.get_or_create(config(Scope::Endpoint(b.clone())));
        if a == b {
            prop_assert!(std::sync::Arc::ptr_eq(&first, &second));
        } else {
            prop_assert!(!std::sync::Arc::ptr_eq(&first, &second));
        }
    }
}
