//! Circuit breaker metrics regression tests.

use super::helpers::*;
use httpsource_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig};
use serial_test::serial;
use std::time::Duration;

#[test]
#[serial]
fn circuitbreaker_metrics_exist() {
    init_recorder();

    let mut breaker = CircuitBreaker::new(
        CircuitBreakerConfig::builder("metrics-cb")
            .failure_threshold(2)
            .reset_window(Duration::from_millis(10))
            .build(),
    );

    breaker.record_failure(false);
    breaker.record_failure(false);

    assert_counter_exists("circuitbreaker_transitions_total");
    assert_metric_has_label("circuitbreaker_transitions_total", "circuit", "metrics-cb");
    assert_metric_has_label("circuitbreaker_transitions_total", "to", "open");
    assert_gauge_exists("circuitbreaker_state");
}
