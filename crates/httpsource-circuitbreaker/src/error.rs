use thiserror::Error;

/// Error returned by circuit breaker operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CircuitBreakerError {
    /// The breaker is `Open` and is not yet due for a probe.
    #[error("circuit '{name}' is open")]
    Open { name: String },
}
