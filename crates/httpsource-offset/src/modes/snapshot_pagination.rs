use crate::error::OffsetError;
use crate::persisted::{OffsetScalar, PersistedOffset};
use crate::traits::OffsetMode;
use httpsource_core::{extract, PartitionKey, Value};

/// A single static endpoint returning a growing snapshot; offset is the
/// largest record key observed so far (spec §4.7).
pub struct SnapshotPagination {
    url: String,
    record_key_pointer: String,
    last_processed_record_key: Option<String>,
}

impl SnapshotPagination {
    pub fn new(url: impl Into<String>, record_key_pointer: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            record_key_pointer: record_key_pointer.into(),
            last_processed_record_key: None,
        }
    }

    /// The subset of `records` whose key is strictly greater than the last
    /// processed key, in original order. A record whose key cannot be
    /// extracted is dropped rather than emitted unordered.
    pub fn filter_new<'a>(&self, records: &'a [Value]) -> Result<Vec<&'a Value>, OffsetError> {
        let mut fresh = Vec::new();
        for record in records {
            if let Some(key) = extract(record, &self.record_key_pointer)?.and_then(record_key_string) {
                if is_strictly_greater(&key, self.last_processed_record_key.as_deref()) {
                    fresh.push(record);
                }
            }
        }
        Ok(fresh)
    }
}

fn record_key_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numeric comparison when both sides parse as integers, lexicographic otherwise.
fn is_strictly_greater(candidate: &str, current: Option<&str>) -> bool {
    let Some(current) = current else { return true };
    match (candidate.parse::<i64>(), current.parse::<i64>()) {
        (Ok(c), Ok(cur)) => c > cur,
        _ => candidate > current,
    }
}

impl OffsetMode for SnapshotPagination {
    fn current(&self) -> PersistedOffset {
        PersistedOffset {
            last_key: self.last_processed_record_key.clone().map(OffsetScalar::Text),
            ..Default::default()
        }
    }

    /// Moves the stored key to the maximum observed across `records`
    /// (expected to be the batch this mode's own [`filter_new`] selected, so
    /// the result is the same as scanning the raw page).
    fn update(&mut self, _response: &Value, records: &[Value]) -> Result<(), OffsetError> {
        for record in records {
            if let Some(key) = extract(record, &self.record_key_pointer)?.and_then(record_key_string) {
                if is_strictly_greater(&key, self.last_processed_record_key.as_deref()) {
                    self.last_processed_record_key = Some(key);
                }
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.last_processed_record_key = None;
    }

    fn resume(&mut self, persisted: &PersistedOffset) {
        self.last_processed_record_key = persisted.last_key.as_ref().and_then(OffsetScalar::as_str).map(str::to_string);
    }

    fn partition_key(&self) -> PartitionKey {
        PartitionKey::linear(&self.url)
    }

    fn next_url(&self, base_path: &str) -> String {
        base_path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filters_only_strictly_greater_keys() {
        let mode = SnapshotPagination::new("https://h/a", "/id");
        let records = vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})];
        let fresh = mode.filter_new(&records).unwrap();
        assert_eq!(fresh.len(), 3);
    }

    #[test]
    fn update_moves_to_maximum_observed() {
        let mut mode = SnapshotPagination::new("https://h/a", "/id");
        let records = vec![json!({"id": 5}), json!({"id": 2}), json!({"id": 9})];
        mode.update(&Value::Null, &records).unwrap();
        assert_eq!(
            mode.current().last_key,
            Some(OffsetScalar::Text("9".to_string()))
        );
    }

    #[test]
    fn subsequent_poll_only_sees_newer_keys() {
        let mut mode = SnapshotPagination::new("https://h/a", "/id");
        mode.update(&Value::Null, &[json!({"id": 5})]).unwrap();
        let records = vec![json!({"id": 3}), json!({"id": 7})];
        let fresh = mode.filter_new(&records).unwrap();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0]["id"], 7);
    }

    #[test]
    fn numeric_comparison_handles_width_correctly() {
        // Lexicographic comparison would put "9" > "10"; numeric must not.
        let mut mode = SnapshotPagination::new("https://h/a", "/id");
        mode.update(&Value::Null, &[json!({"id": "9"})]).unwrap();
        let fresh = mode.filter_new(&[json!({"id": "10"})]).unwrap();
        assert_eq!(fresh.len(), 1);
    }
}
