//! Endpoint identifiers.

use std::fmt;

/// Maximum number of endpoints a single task may own (spec: 1..15).
pub const MAX_ENDPOINTS: u8 = 15;

/// A stable endpoint identifier, 1-indexed as in the `apiN.*` configuration surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EndpointId(u8);

/// Error returned when an endpoint id is out of the valid `1..=15` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("endpoint id {0} out of range (1..={})", MAX_ENDPOINTS)]
pub struct EndpointIdOutOfRange(pub u8);

impl EndpointId {
    /// Constructs an endpoint id, validating the `1..=15` range.
    pub fn new(n: u8) -> Result<Self, EndpointIdOutOfRange> {
        if n == 0 || n > MAX_ENDPOINTS {
            Err(EndpointIdOutOfRange(n))
        } else {
            Ok(Self(n))
        }
    }

    /// Returns the raw numeric id (`apiN` -> `N`).
    pub fn get(self) -> u8 {
        self.0
    }

    /// The config-surface prefix for this endpoint, e.g. `api3`.
    pub fn config_prefix(self) -> String {
        format!("api{}", self.0)
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "api{}", self.0)
    }
}

impl TryFrom<u8> for EndpointId {
    type Error = EndpointIdOutOfRange;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
