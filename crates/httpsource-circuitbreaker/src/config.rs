use std::time::Duration;

/// Configuration for one endpoint's [`crate::CircuitBreaker`].
///
/// Corresponds to `circuit.breaker.failure.threshold` and
/// `circuit.breaker.reset.ms` in the task's configuration surface.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub(crate) name: String,
    pub(crate) failure_threshold: usize,
    pub(crate) failure_window: Duration,
    pub(crate) reset_window: Duration,
}

impl CircuitBreakerConfig {
    /// Starts a builder with the given breaker name (typically the endpoint id).
    pub fn builder(name: impl Into<String>) -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder {
            name: name.into(),
            failure_threshold: 5,
            failure_window: Duration::from_secs(60),
            reset_window: Duration::from_secs(30),
        }
    }

    /// The breaker's name, used in events and metrics labels.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How long the breaker stays `Open` before admitting a probe.
    pub fn reset_window(&self) -> Duration {
        self.reset_window
    }
}

/// Builder for [`CircuitBreakerConfig`].
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfigBuilder {
    name: String,
    failure_threshold: usize,
    failure_window: Duration,
    reset_window: Duration,
}

impl CircuitBreakerConfigBuilder {
    /// Number of failures within `failure_window` that opens the circuit.
    pub fn failure_threshold(mut self, threshold: usize) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    /// The sliding window over which failures are counted.
    pub fn failure_window(mut self, window: Duration) -> Self {
        self.failure_window = window;
        self
    }

    /// How long `Open` is held before a single probe is admitted in `HalfOpen`.
    pub fn reset_window(mut self, window: Duration) -> Self {
        self.reset_window = window;
        self
    }

    /// Builds the config.
    pub fn build(self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            name: self.name,
            failure_threshold: self.failure_threshold,
            failure_window: self.failure_window,
            reset_window: self.reset_window,
        }
    }
}
