use crate::error::OffsetError;
use crate::persisted::PersistedOffset;
use httpsource_core::{PartitionKey, Value};

/// Common surface every offset mode implements (spec §4.7).
///
/// `update` must be atomic from the caller's point of view: either the whole
/// batch advances the offset or the mode is left untouched. Implementations
/// achieve this by only committing state after the full batch has been
/// scanned, never incrementally per record.
pub trait OffsetMode {
    /// The current checkpointable offset.
    fn current(&self) -> PersistedOffset;

    /// Advances state based on one fetched page's response body and the
    /// records extracted from it.
    fn update(&mut self, response: &Value, records: &[Value]) -> Result<(), OffsetError>;

    /// Returns to the mode's starting state (spec §4.7 `reset()`).
    fn reset(&mut self);

    /// Rehydrates state from a checkpoint read back from the host's offset
    /// store. A no-op by default; modes that persist more than their `new()`
    /// constructor already accepts override this.
    fn resume(&mut self, _persisted: &PersistedOffset) {}

    /// The partition key this mode's offset is persisted under (spec §6).
    fn partition_key(&self) -> PartitionKey;

    /// Builds the URL for the next poll given the endpoint's configured base path.
    fn next_url(&self, base_path: &str) -> String;
}
