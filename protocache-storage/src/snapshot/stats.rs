//! Snapshot statistics and id analysis.

use chrono::{DateTime, Utc};
use protocache_core::PrototypeId;
use serde::{Deserialize, Serialize};

/// Point-in-time statistics about the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStats {
    /// Number of records.
    pub size: usize,
    /// When the live snapshot was written, `None` if never populated.
    pub cached_at: Option<DateTime<Utc>>,
    pub ttl_ms: u64,
    pub is_expired: bool,
    /// Serialized JSON size of the live snapshot.
    pub approx_size_bytes: usize,
    pub max_id: Option<PrototypeId>,
}

/// Id range over the snapshot; both bounds are `None` when it is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SnapshotAnalysis {
    pub min: Option<PrototypeId>,
    pub max: Option<PrototypeId>,
}

impl SnapshotAnalysis {
    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = PrototypeId>,
    {
        ids.into_iter().fold(Self::default(), |acc, id| Self {
            min: Some(acc.min.map_or(id, |m| m.min(id))),
            max: Some(acc.max.map_or(id, |m| m.max(id))),
        })
    }
}
