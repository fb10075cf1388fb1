//! PROTOCACHE Storage - Snapshot Store and Refresh Coordinator
//!
//! Keeps the most recent batch of normalized prototypes in memory and
//! refreshes it from an upstream [`PrototypeFetcher`], coalescing concurrent
//! refreshes into a single fetch.

pub mod fetcher;
pub mod mock;
pub mod repository;
pub mod snapshot;

pub use fetcher::{FetchResponse, PrototypeFetcher};
pub use mock::MockFetcher;
pub use repository::{CoalescingStats, RefreshResult, SnapshotRepository};
pub use snapshot::{ReplaceOutcome, SnapshotAnalysis, SnapshotStats, SnapshotStore};
