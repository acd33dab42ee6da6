//! Per-endpoint circuit breaker (spec §3 CircuitState, §4.4).
//!
//! A three-state (`Closed`/`Open`/`HalfOpen`) breaker with a sliding failure
//! window and an AUTH fast-open path. Each endpoint owns exactly one instance;
//! there is no cross-endpoint sharing.

mod circuit;
mod config;
mod error;
mod events;

pub use circuit::{next_probe_instant, CircuitBreaker, CircuitState};
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
pub use error::CircuitBreakerError;
pub use events::CircuitBreakerEvent;
