use httpsource_core::SourceEvent;
use std::time::Instant;

/// Events emitted by a [`crate::FetchCache`].
#[derive(Debug, Clone)]
pub enum CacheEvent {
    Hit { key: String, timestamp: Instant },
    Miss { key: String, timestamp: Instant },
    Evicted { key: String, timestamp: Instant },
}

impl SourceEvent for CacheEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Hit { .. } => "hit",
            Self::Miss { .. } => "miss",
            Self::Evicted { .. } => "evicted",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::Hit { timestamp, .. }
            | Self::Miss { timestamp, .. }
            | Self::Evicted { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            Self::Hit { key, .. } | Self::Miss { key, .. } | Self::Evicted { key, .. } => key,
        }
    }
}
