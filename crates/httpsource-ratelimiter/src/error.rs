use std::time::Duration;
use thiserror::Error;

/// Error returned when a permit could not be acquired.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("rate limited, retry after {wait:?}")]
pub struct RateLimitedError {
    /// How long the caller should wait before retrying.
    pub wait: Duration,
}
