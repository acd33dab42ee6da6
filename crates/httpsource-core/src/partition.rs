//! The partition-key shape persisted by the host's offset store (spec §6).

use crate::Value;
use serde_json::Map;
use std::collections::BTreeMap;

/// The durable identifier under which offsets for one endpoint (or
/// endpoint+parent, for a chaining child) are stored.
///
/// Linear endpoints use `{ "url": canonical_endpoint_url }`; chaining children
/// additionally carry `{ "parent": <parent_value> }`. Both fields are strings,
/// so the key is `Hash + Ord` and can be used directly as a map key by the
/// Task Coordinator and Offset Manager.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey(BTreeMap<String, String>);

impl PartitionKey {
    /// Builds the partition key for a linear (non-chaining) endpoint.
    pub fn linear(canonical_url: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert("url".to_string(), canonical_url.into());
        Self(map)
    }

    /// Builds the partition key for a chaining child, scoped to one parent value.
    pub fn chained(canonical_url: impl Into<String>, parent_value: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert("url".to_string(), canonical_url.into());
        map.insert("parent".to_string(), parent_value.into());
        Self(map)
    }

    /// Returns the underlying string map.
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    /// True if this key belongs to a chaining child (carries a `parent` field).
    pub fn is_chained(&self) -> bool {
        self.0.contains_key("parent")
    }

    /// Renders the key as a JSON object, the shape the host's `OffsetReader` sees.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (k, v) in &self.0 {
            map.insert(k.clone(), Value::String(v.clone()));
        }
        Value::Object(map)
    }
}
