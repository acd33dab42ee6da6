//! Property tests for offset monotonicity (§8).
//!
//! SIMPLE_INCREMENTING: the offset strictly increases by exactly the number
//! of records emitted in each batch. SNAPSHOT_PAGINATION: `last_key` is
//! non-decreasing across any sequence of batches.

use httpsource_offset::{OffsetMode, OffsetScalar, SimpleIncrementing, SnapshotPagination};
use proptest::prelude::*;
use serde_json::{json, Value};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn simple_incrementing_advances_by_exactly_the_batch_size(batch_sizes in prop::collection::vec(0usize..20, 1..10)) {
        let mut mode = SimpleIncrementing::new("https://h/a", 0);
        let mut expected = 0u64;
        for size in batch_sizes {
            let records: Vec<Value> = (0..size).map(|_| Value::Null).collect();
            mode.update(&Value::Null, &records).unwrap();
            expected += size as u64;
            prop_assert_eq!(mode.current().offset, Some(OffsetScalar::Integer(expected as i64)));
        }
    }

    #[test]
    fn snapshot_pagination_last_key_is_non_decreasing(keys in prop::collection::vec(0i64..1000, 1..30)) {
        let mut mode = SnapshotPagination::new("https://h/a", "/id");
        let mut max_seen: Option<i64> = None;

        for key in keys {
            let records = vec![json!({"id": key})];
            mode.update(&Value::Null, &records).unwrap();
            let current = mode
                .current()
                .last_key
                .and_then(|k| k.as_i64())
                .unwrap_or(i64::MIN);

            max_seen = Some(max_seen.map_or(key, |m| m.max(key)));
            prop_assert_eq!(current, max_seen.unwrap());
        }
    }
}
