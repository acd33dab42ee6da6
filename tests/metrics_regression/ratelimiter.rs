//! Rate limiter metrics regression tests.

use super::helpers::*;
use httpsource_ratelimiter::{Algorithm, AcquireDecision, RateLimiterConfig, RateLimiterRegistry, Scope};
use serial_test::serial;

#[test]
#[serial]
fn ratelimiter_metrics_exist() {
    init_recorder();

    let limiter = RateLimiterRegistry::new().get_or_create(
        RateLimiterConfig::builder(Algorithm::TokenBucket, Scope::Endpoint("metrics-rl".into()))
            .capacity(1)
            .refill_per_second(0.0)
            .build(),
    );

    assert_eq!(limiter.try_acquire(), AcquireDecision::Allowed);
    assert!(matches!(limiter.try_acquire(), AcquireDecision::Denied { .. }));

    assert_counter_exists("ratelimiter_permits_total");
    assert_metric_has_label("ratelimiter_permits_total", "outcome", "allowed");
    assert_metric_has_label("ratelimiter_permits_total", "outcome", "denied");
}
