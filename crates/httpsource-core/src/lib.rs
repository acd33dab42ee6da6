//! Shared infrastructure for httpsource.
//!
//! This crate provides the pieces every other `httpsource-*` crate depends on:
//! - The dynamic record value tree ([`Value`]) and JSON-pointer based extraction
//! - Stable endpoint identifiers and the partition-key shape the host framework persists
//! - An event system for observability, in the same shape across every component

pub mod events;
pub mod ids;
pub mod partition;
pub mod pointer;

pub use events::{EventListener, EventListeners, SourceEvent};
pub use ids::EndpointId;
pub use partition::PartitionKey;
pub use pointer::{extract, PointerError};

/// The dynamic record value tree: object, array, string, number, bool or null.
///
/// `serde_json::Value` already has exactly this shape, so it is reused directly
/// rather than re-implemented.
pub type Value = serde_json::Value;
