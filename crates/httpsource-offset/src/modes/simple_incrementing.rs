use crate::error::OffsetError;
use crate::persisted::{OffsetScalar, PersistedOffset};
use crate::traits::OffsetMode;
use httpsource_core::{PartitionKey, Value};

/// Offset is a non-negative integer, incremented by one per record emitted.
pub struct SimpleIncrementing {
    url: String,
    offset: u64,
}

impl SimpleIncrementing {
    pub fn new(url: impl Into<String>, initial: u64) -> Self {
        Self {
            url: url.into(),
            offset: initial,
        }
    }
}

impl OffsetMode for SimpleIncrementing {
    fn current(&self) -> PersistedOffset {
        PersistedOffset {
            offset: Some(OffsetScalar::Integer(self.offset as i64)),
            ..Default::default()
        }
    }

    fn update(&mut self, _response: &Value, records: &[Value]) -> Result<(), OffsetError> {
        self.offset += records.len() as u64;
        Ok(())
    }

    fn reset(&mut self) {
        self.offset = 0;
    }

    fn resume(&mut self, persisted: &PersistedOffset) {
        if let Some(offset) = persisted.offset.as_ref().and_then(OffsetScalar::as_i64) {
            self.offset = offset.max(0) as u64;
        }
    }

    fn partition_key(&self) -> PartitionKey {
        PartitionKey::linear(&self.url)
    }

    fn next_url(&self, base_path: &str) -> String {
        if base_path.contains("${offset}") {
            base_path.replace("${offset}", &self.offset.to_string())
        } else {
            base_path.to_string()
        }
    }
}
