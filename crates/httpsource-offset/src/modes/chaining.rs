use crate::error::OffsetError;
use crate::persisted::PersistedOffset;
use crate::traits::OffsetMode;
use httpsource_core::{PartitionKey, Value};

/// Wraps a child endpoint's own offset mode, partition-keyed by
/// `(child id, parent value)` (spec §4.7, §4.8).
pub struct Chaining {
    child_id: String,
    parent_value: String,
    inner: Box<dyn OffsetMode + Send>,
}

impl Chaining {
    pub fn new(child_id: impl Into<String>, parent_value: impl Into<String>, inner: Box<dyn OffsetMode + Send>) -> Self {
        Self {
            child_id: child_id.into(),
            parent_value: parent_value.into(),
            inner,
        }
    }

    pub fn parent_value(&self) -> &str {
        &self.parent_value
    }

    /// Rebinds this wrapper to a new parent value, e.g. when a coordinator
    /// reuses one child runner across successive chain deliveries.
    pub fn set_parent_value(&mut self, parent_value: impl Into<String>) {
        self.parent_value = parent_value.into();
    }
}

impl OffsetMode for Chaining {
    fn current(&self) -> PersistedOffset {
        self.inner.current()
    }

    fn update(&mut self, response: &Value, records: &[Value]) -> Result<(), OffsetError> {
        self.inner.update(response, records)
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn resume(&mut self, persisted: &PersistedOffset) {
        self.inner.resume(persisted);
    }

    fn partition_key(&self) -> PartitionKey {
        PartitionKey::chained(&self.child_id, &self.parent_value)
    }

    fn next_url(&self, base_path: &str) -> String {
        let substituted = base_path.replace("${parent_value}", &self.parent_value);
        self.inner.next_url(&substituted)
    }
}
