//! Property tests for the circuit breaker.
//!
//! Invariant tested: OPEN suppresses every call; exactly one probe is
//! admitted in HALF_OPEN.

use httpsource_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use proptest::prelude::*;
use std::thread::sleep;
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn open_rejects_every_call_until_reset_window_elapses(
        threshold in 1usize..=8,
        extra_calls in 0usize..10,
    ) {
        let mut breaker = CircuitBreaker::new(
            CircuitBreakerConfig::builder("prop-cb-open")
                .failure_threshold(threshold)
                .reset_window(Duration::from_millis(200))
                .build(),
        );

        for _ in 0..threshold {
            breaker.record_failure(false);
        }
        prop_assert_eq!(breaker.state(), CircuitState::Open);

        for _ in 0..extra_calls {
            prop_assert!(breaker.can_proceed().is_err());
        }
    }

    #[test]
    fn half_open_admits_exactly_one_probe_regardless_of_threshold(threshold in 1usize..=8) {
        let mut breaker = CircuitBreaker::new(
            CircuitBreakerConfig::builder("prop-cb-half-open")
                .failure_threshold(threshold)
                .reset_window(Duration::from_millis(10))
                .build(),
        );
        for _ in 0..threshold {
            breaker.record_failure(false);
        }
        sleep(Duration::from_millis(20));

        prop_assert!(breaker.can_proceed().is_ok());
        prop_assert_eq!(breaker.state(), CircuitState::HalfOpen);
        // A second attempt while the probe is outstanding is rejected.
        prop_assert!(breaker.can_proceed().is_err());
    }

    #[test]
    fn auth_failure_always_opens_on_the_first_call(threshold in 2usize..=20) {
        let mut breaker = CircuitBreaker::new(
            CircuitBreakerConfig::builder("prop-cb-auth")
                .failure_threshold(threshold)
                .reset_window(Duration::from_secs(60))
                .build(),
        );
        breaker.record_failure(true);
        prop_assert_eq!(breaker.state(), CircuitState::Open);
    }
}
