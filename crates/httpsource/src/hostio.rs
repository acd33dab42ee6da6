//! Host-framework contract (spec §6 "External interfaces").

use async_trait::async_trait;
use httpsource_core::{PartitionKey, Value};
use std::time::{Duration, SystemTime};

/// One emitted record (spec §3 EmittedRecord).
#[derive(Debug, Clone)]
pub struct EmittedRecord {
    pub topic: String,
    pub key: Option<String>,
    pub value: Value,
    pub source_partition: PartitionKey,
    pub source_offset: Value,
    pub timestamp: SystemTime,
}

/// Outbound, read: `read(partition_key) → opaque_offset | nil`.
#[async_trait]
pub trait OffsetReader: Send + Sync {
    async fn read(&self, partition_key: &PartitionKey) -> Option<Value>;
}

/// Outbound, emit. Must be safe for concurrent calls (spec §6).
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn emit(&self, record: EmittedRecord) -> Result<(), String>;
}

/// Inbound: the three calls the host framework makes into this task.
#[async_trait]
pub trait HostHandle: Send + Sync {
    async fn start(&self) -> Result<(), String>;
    async fn stop(&self);
    /// Pull-model drain of the emit channel with a deadline, returning
    /// whatever is available (spec §6).
    async fn poll(&self, deadline: Duration) -> Vec<EmittedRecord>;

    /// True once the task has stopped a runner on a fatal-classified error
    /// under `behavior.on.error = FAIL` (spec §4.2, §6). Default `false` for
    /// host handles that have no such notion of failure.
    fn has_failed_fatally(&self) -> bool {
        false
    }
}
