use crate::CircuitState;
use httpsource_core::SourceEvent;
use std::time::Instant;

/// Events emitted by a [`crate::CircuitBreaker`].
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    /// The breaker moved from one state to another.
    StateTransition {
        name: String,
        timestamp: Instant,
        from: CircuitState,
        to: CircuitState,
    },
    /// A call was permitted to proceed.
    CallPermitted { name: String, timestamp: Instant },
    /// A call was rejected because the breaker is `Open` or the `HalfOpen`
    /// probe slot is taken.
    CallRejected { name: String, timestamp: Instant },
    /// A single AUTH-kind failure forced the breaker directly to `Open`.
    AuthFastOpen { name: String, timestamp: Instant },
}

impl SourceEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::StateTransition { .. } => "state_transition",
            Self::CallPermitted { .. } => "call_permitted",
            Self::CallRejected { .. } => "call_rejected",
            Self::AuthFastOpen { .. } => "auth_fast_open",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::StateTransition { timestamp, .. }
            | Self::CallPermitted { timestamp, .. }
            | Self::CallRejected { timestamp, .. }
            | Self::AuthFastOpen { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            Self::StateTransition { name, .. }
            | Self::CallPermitted { name, .. }
            | Self::CallRejected { name, .. }
            | Self::AuthFastOpen { name, .. } => name,
        }
    }
}
