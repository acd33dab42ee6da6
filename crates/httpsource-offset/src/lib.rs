//! Offset/pagination state machines (spec §4.7).
//!
//! Five modes share one [`OffsetMode`] trait and are dispatched through the
//! [`OffsetManager`] enum, chosen once at construction time from the
//! endpoint's configured `http.offset.mode` — the mode cannot change at
//! runtime (spec §4.7 invariant).

mod error;
mod modes;
mod persisted;
mod traits;

pub use error::OffsetError;
pub use modes::{Chaining, CursorPagination, ODataPagination, ODataTokenMode, SimpleIncrementing, SnapshotPagination};
pub use persisted::{OffsetScalar, PersistedOffset, TokenKind};
pub use traits::OffsetMode;

use httpsource_core::{PartitionKey, Value};

/// Enum-dispatched wrapper over the five offset modes, so call sites hold one
/// concrete type regardless of which mode an endpoint is configured with.
pub enum OffsetManager {
    SimpleIncrementing(SimpleIncrementing),
    CursorPagination(CursorPagination),
    ODataPagination(ODataPagination),
    SnapshotPagination(SnapshotPagination),
    Chaining(Chaining),
}

impl OffsetManager {
    /// The records a poll should actually emit this cycle. Only
    /// [`OffsetManager::SnapshotPagination`] filters (spec §4.7); every
    /// other mode emits everything the page returned.
    pub fn filter_emittable<'a>(&self, records: &'a [Value]) -> Result<Vec<&'a Value>, OffsetError> {
        match self {
            Self::SnapshotPagination(mode) => mode.filter_new(records),
            _ => Ok(records.iter().collect()),
        }
    }
}

impl OffsetMode for OffsetManager {
    fn current(&self) -> PersistedOffset {
        match self {
            Self::SimpleIncrementing(m) => m.current(),
            Self::CursorPagination(m) => m.current(),
            Self::ODataPagination(m) => m.current(),
            Self::SnapshotPagination(m) => m.current(),
            Self::Chaining(m) => m.current(),
        }
    }

    fn update(&mut self, response: &Value, records: &[Value]) -> Result<(), OffsetError> {
        match self {
            Self::SimpleIncrementing(m) => m.update(response, records),
            Self::CursorPagination(m) => m.update(response, records),
            Self::ODataPagination(m) => m.update(response, records),
            Self::SnapshotPagination(m) => m.update(response, records),
            Self::Chaining(m) => m.update(response, records),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::SimpleIncrementing(m) => m.reset(),
            Self::CursorPagination(m) => m.reset(),
            Self::ODataPagination(m) => m.reset(),
            Self::SnapshotPagination(m) => m.reset(),
            Self::Chaining(m) => m.reset(),
        }
    }

    fn resume(&mut self, persisted: &PersistedOffset) {
        match self {
            Self::SimpleIncrementing(m) => m.resume(persisted),
            Self::CursorPagination(m) => m.resume(persisted),
            Self::ODataPagination(m) => m.resume(persisted),
            Self::SnapshotPagination(m) => m.resume(persisted),
            Self::Chaining(m) => m.resume(persisted),
        }
    }

    fn partition_key(&self) -> PartitionKey {
        match self {
            Self::SimpleIncrementing(m) => m.partition_key(),
            Self::CursorPagination(m) => m.partition_key(),
            Self::ODataPagination(m) => m.partition_key(),
            Self::SnapshotPagination(m) => m.partition_key(),
            Self::Chaining(m) => m.partition_key(),
        }
    }

    fn next_url(&self, base_path: &str) -> String {
        match self {
            Self::SimpleIncrementing(m) => m.next_url(base_path),
            Self::CursorPagination(m) => m.next_url(base_path),
            Self::ODataPagination(m) => m.next_url(base_path),
            Self::SnapshotPagination(m) => m.next_url(base_path),
            Self::Chaining(m) => m.next_url(base_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dispatches_to_simple_incrementing() {
        let mut manager = OffsetManager::SimpleIncrementing(SimpleIncrementing::new("https://h/a", 0));
        manager.update(&Value::Null, &[Value::Null, Value::Null]).unwrap();
        assert_eq!(
            manager.current().offset,
            Some(OffsetScalar::Integer(2))
        );
    }

    #[test]
    fn snapshot_mode_is_the_only_one_that_filters() {
        let manager = OffsetManager::SnapshotPagination(SnapshotPagination::new("https://h/a", "/id"));
        let records = vec![json!({"id": 1}), json!({"id": 2})];
        assert_eq!(manager.filter_emittable(&records).unwrap().len(), 2);

        let manager = OffsetManager::CursorPagination(CursorPagination::new("https://h/a", "/next"));
        assert_eq!(manager.filter_emittable(&records).unwrap().len(), 2);
    }
}
