use crate::error::OffsetError;
use crate::persisted::{OffsetScalar, PersistedOffset};
use crate::traits::OffsetMode;
use httpsource_core::{extract, PartitionKey, Value};

/// Offset is an opaque cursor string extracted from each response via a JSON pointer.
pub struct CursorPagination {
    url: String,
    cursor_pointer: String,
    cursor: Option<String>,
}

impl CursorPagination {
    pub fn new(url: impl Into<String>, cursor_pointer: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cursor_pointer: cursor_pointer.into(),
            cursor: None,
        }
    }

    /// An absent or empty cursor means pagination is complete for this cycle.
    pub fn is_complete(&self) -> bool {
        self.cursor.is_none()
    }
}

impl OffsetMode for CursorPagination {
    fn current(&self) -> PersistedOffset {
        PersistedOffset {
            offset: self.cursor.clone().map(OffsetScalar::Text),
            ..Default::default()
        }
    }

    fn update(&mut self, response: &Value, _records: &[Value]) -> Result<(), OffsetError> {
        let next = extract(response, &self.cursor_pointer)?
            .and_then(Value::as_str)
            .map(str::to_string)
            .filter(|s| !s.is_empty());
        self.cursor = next;
        Ok(())
    }

    fn reset(&mut self) {
        self.cursor = None;
    }

    fn resume(&mut self, persisted: &PersistedOffset) {
        self.cursor = persisted.offset.as_ref().and_then(OffsetScalar::as_str).map(str::to_string);
    }

    fn partition_key(&self) -> PartitionKey {
        PartitionKey::linear(&self.url)
    }

    fn next_url(&self, base_path: &str) -> String {
        match &self.cursor {
            Some(cursor) if base_path.contains("${cursor}") => base_path.replace("${cursor}", cursor),
            Some(cursor) => format!("{base_path}?cursor={cursor}"),
            None => base_path.to_string(),
        }
    }
}
