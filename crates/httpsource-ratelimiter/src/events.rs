use httpsource_core::SourceEvent;
use std::time::{Duration, Instant};

/// Events emitted by a [`crate::RateLimiter`].
#[derive(Debug, Clone)]
pub enum RateLimiterEvent {
    /// A permit was granted.
    PermitAcquired { scope: String, timestamp: Instant },
    /// A permit was denied and the caller should retry after `wait`.
    PermitDenied {
        scope: String,
        timestamp: Instant,
        wait: Duration,
    },
}

impl SourceEvent for RateLimiterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::PermitAcquired { .. } => "permit_acquired",
            Self::PermitDenied { .. } => "permit_denied",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::PermitAcquired { timestamp, .. } | Self::PermitDenied { timestamp, .. } => {
                *timestamp
            }
        }
    }

    fn source_name(&self) -> &str {
        match self {
            Self::PermitAcquired { scope, .. } | Self::PermitDenied { scope, .. } => scope,
        }
    }
}
