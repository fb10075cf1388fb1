//! Snapshot store: the canonical dataset held in memory.
//!
//! [`SnapshotStore`] keeps exactly one snapshot generation live. Reads are
//! synchronous and never wait on the network; writes replace the dataset as a
//! unit and are refused when the serialized payload exceeds the configured
//! ceiling.

pub mod stats;
pub mod store;

pub use stats::{SnapshotAnalysis, SnapshotStats};
pub use store::{ReplaceOutcome, SnapshotStore};
