//! In-memory snapshot store.
//!
//! Holds the whole canonical dataset as one [`Snapshot`]: the ordered list as
//! fetched plus an id index into it. Every write replaces the snapshot
//! wholesale; readers either see the old one or the new one, never a mix.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use protocache_core::{ConfigError, Prototype, PrototypeId, SnapshotStoreConfig};
use rand::seq::IndexedRandom;

use super::stats::SnapshotStats;

/// Result of a [`SnapshotStore::replace`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// The new snapshot is live.
    Applied { records: usize, size_bytes: usize },
    /// The payload exceeded the size ceiling; the previous snapshot is kept.
    SkippedOversize { size_bytes: usize, limit_bytes: usize },
}

impl ReplaceOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// One complete, immutable generation of cached records.
#[derive(Debug, Clone, Default)]
struct Snapshot {
    records: Arc<Vec<Prototype>>,
    index: HashMap<PrototypeId, usize>,
    cached_at: Option<DateTime<Utc>>,
    approx_size_bytes: usize,
    max_id: Option<PrototypeId>,
}

impl Snapshot {
    fn build(records: Vec<Prototype>, size_bytes: usize, cached_at: DateTime<Utc>) -> Self {
        let index = records
            .iter()
            .enumerate()
            .map(|(pos, record)| (record.id, pos))
            .collect();
        let max_id = records.iter().map(|p| p.id).max();

        Self {
            records: Arc::new(records),
            index,
            cached_at: Some(cached_at),
            approx_size_bytes: size_bytes,
            max_id,
        }
    }

    fn is_expired_at(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match self.cached_at {
            None => true,
            Some(cached_at) => match chrono::Duration::from_std(ttl) {
                Ok(ttl) => now.signed_duration_since(cached_at) > ttl,
                Err(_) => false,
            },
        }
    }
}

/// Drop any id seen earlier in the batch.
fn dedupe(records: Vec<Prototype>) -> Vec<Prototype> {
    let mut seen = HashSet::with_capacity(records.len());
    let total = records.len();
    let kept: Vec<Prototype> = records
        .into_iter()
        .filter(|record| seen.insert(record.id))
        .collect();

    let duplicates = total - kept.len();
    if duplicates > 0 {
        tracing::warn!(duplicates, "Dropped duplicate prototype ids from batch");
    }
    kept
}

/// Thread-safe owner of the current snapshot.
#[derive(Debug)]
pub struct SnapshotStore {
    config: SnapshotStoreConfig,
    current: RwLock<Snapshot>,
}

impl SnapshotStore {
    /// Create an empty store.
    ///
    /// Fails when the configured size ceiling exceeds the hard platform limit.
    pub fn new(config: SnapshotStoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            current: RwLock::new(Snapshot::default()),
        })
    }

    /// Create a store with default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: SnapshotStoreConfig::default(),
            current: RwLock::new(Snapshot::default()),
        }
    }

    pub fn config(&self) -> &SnapshotStoreConfig {
        &self.config
    }

    /// Replace the whole dataset.
    ///
    /// Duplicate ids are dropped first; the serialized JSON size of what
    /// remains is then checked against the ceiling. An oversize payload is
    /// skipped with a warning and the current snapshot stays live.
    pub fn replace(&self, records: Vec<Prototype>) -> ReplaceOutcome {
        let records = dedupe(records);
        let size_bytes = serialized_size(&records);
        let limit_bytes = self.config.max_data_size_bytes;

        if size_bytes > limit_bytes {
            tracing::warn!(
                size_bytes,
                limit_bytes,
                records = records.len(),
                "Snapshot exceeds size ceiling, keeping previous data"
            );
            return ReplaceOutcome::SkippedOversize {
                size_bytes,
                limit_bytes,
            };
        }

        let next = Snapshot::build(records, size_bytes, Utc::now());
        let count = next.records.len();
        let max_id = next.max_id;

        *self.write() = next;

        tracing::info!(records = count, size_bytes, max_id = ?max_id, "Snapshot replaced");
        ReplaceOutcome::Applied {
            records: count,
            size_bytes,
        }
    }

    /// O(1) lookup by id.
    pub fn get_by_id(&self, id: PrototypeId) -> Option<Prototype> {
        let snapshot = self.read();
        snapshot
            .index
            .get(&id)
            .and_then(|&pos| snapshot.records.get(pos))
            .cloned()
    }

    /// Shared read-only view of the ordered records.
    pub fn get_all(&self) -> Arc<Vec<Prototype>> {
        Arc::clone(&self.read().records)
    }

    /// Uniformly random record, `None` when empty.
    pub fn get_random(&self) -> Option<Prototype> {
        let records = self.get_all();
        records.choose(&mut rand::rng()).cloned()
    }

    /// Ids in snapshot order.
    pub fn ids(&self) -> Vec<PrototypeId> {
        self.read().records.iter().map(|p| p.id).collect()
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Largest id in the snapshot.
    pub fn max_id(&self) -> Option<PrototypeId> {
        self.read().max_id
    }

    pub fn cached_at(&self) -> Option<DateTime<Utc>> {
        self.read().cached_at
    }

    /// True when never populated or older than the TTL.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Expiry check against an explicit clock reading.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.read().is_expired_at(self.config.ttl, now)
    }

    pub fn get_stats(&self) -> SnapshotStats {
        let snapshot = self.read();
        SnapshotStats {
            size: snapshot.records.len(),
            cached_at: snapshot.cached_at,
            ttl_ms: self.config.ttl_ms(),
            is_expired: snapshot.is_expired_at(self.config.ttl, Utc::now()),
            approx_size_bytes: snapshot.approx_size_bytes,
            max_id: snapshot.max_id,
        }
    }

    // Writes are single assignments, so a poisoned lock still guards a whole snapshot.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, Snapshot> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Snapshot> {
        self.current.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Serialized JSON size; anything unserializable counts as unbounded.
fn serialized_size(records: &[Prototype]) -> usize {
    serde_json::to_vec(records)
        .map(|bytes| bytes.len())
        .unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocache_core::{normalize_record, UpstreamRecord, HARD_MAX_DATA_SIZE_BYTES};

    fn prototype(id: PrototypeId) -> Prototype {
        let mut record = UpstreamRecord::with_id(id);
        record.prototype_nm = Some(format!("Prototype {}", id));
        normalize_record(&record)
    }

    fn prototypes(ids: &[PrototypeId]) -> Vec<Prototype> {
        ids.iter().copied().map(prototype).collect()
    }

    #[test]
    fn test_new_store_is_empty_and_expired() {
        let store = SnapshotStore::with_defaults();
        assert!(store.is_empty());
        assert!(store.is_expired());
        assert_eq!(store.max_id(), None);
        assert_eq!(store.get_random(), None);

        let stats = store.get_stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.cached_at, None);
        assert!(stats.is_expired);
        assert_eq!(stats.ttl_ms, 1_800_000);
    }

    #[test]
    fn test_construction_rejects_ceiling_above_hard_limit() {
        let config =
            SnapshotStoreConfig::new().with_max_data_size(HARD_MAX_DATA_SIZE_BYTES + 1);
        let err = SnapshotStore::new(config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref field, .. } if field == "max_data_size_bytes"
        ));
    }

    #[test]
    fn test_replace_populates_index_and_order() {
        let store = SnapshotStore::with_defaults();
        let outcome = store.replace(prototypes(&[3, 1, 2]));

        assert!(outcome.is_applied());
        assert_eq!(store.ids(), vec![3, 1, 2]);
        assert_eq!(store.len(), 3);
        assert_eq!(store.max_id(), Some(3));
        assert_eq!(
            store.get_by_id(1).map(|p| p.prototype_nm),
            Some("Prototype 1".to_string())
        );
        assert_eq!(store.get_by_id(99), None);
        assert!(!store.is_expired());
    }

    #[test]
    fn test_replace_swaps_whole_dataset() {
        let store = SnapshotStore::with_defaults();
        store.replace(prototypes(&[1, 2, 3]));
        store.replace(prototypes(&[10]));

        assert_eq!(store.ids(), vec![10]);
        assert_eq!(store.get_by_id(1), None);
        assert_eq!(store.max_id(), Some(10));
    }

    #[test]
    fn test_replace_with_empty_batch_clears_max_id() {
        let store = SnapshotStore::with_defaults();
        store.replace(prototypes(&[4]));
        let outcome = store.replace(Vec::new());

        assert_eq!(outcome, ReplaceOutcome::Applied { records: 0, size_bytes: 2 });
        assert!(store.is_empty());
        assert_eq!(store.max_id(), None);
        assert!(store.cached_at().is_some());
    }

    #[test]
    fn test_oversize_payload_is_rejected() {
        let config = SnapshotStoreConfig::new().with_max_data_size(100);
        let store = SnapshotStore::new(config).unwrap();

        let mut big = UpstreamRecord::with_id(1);
        big.summary = Some("x".repeat(10_000));
        let outcome = store.replace(vec![normalize_record(&big)]);

        match outcome {
            ReplaceOutcome::SkippedOversize { size_bytes, limit_bytes } => {
                assert!(size_bytes > 10_000);
                assert_eq!(limit_bytes, 100);
            }
            other => panic!("expected oversize skip, got {:?}", other),
        }
        assert_eq!(store.get_stats().size, 0);
        assert!(store.cached_at().is_none());
    }

    #[test]
    fn test_oversize_payload_keeps_previous_snapshot() {
        let config = SnapshotStoreConfig::new().with_max_data_size(2_000);
        let store = SnapshotStore::new(config).unwrap();
        store.replace(prototypes(&[1, 2]));
        let before = store.get_stats();

        let mut big = UpstreamRecord::with_id(3);
        big.summary = Some("y".repeat(5_000));
        let outcome = store.replace(vec![normalize_record(&big)]);

        assert!(!outcome.is_applied());
        assert_eq!(store.ids(), vec![1, 2]);
        assert_eq!(store.get_stats(), before);
    }

    #[test]
    fn test_duplicate_ids_keep_first_occurrence() {
        let store = SnapshotStore::with_defaults();
        let mut records = prototypes(&[1, 2]);
        let mut dup = prototype(1);
        dup.prototype_nm = "Duplicate".to_string();
        records.push(dup);

        store.replace(records);
        assert_eq!(store.ids(), vec![1, 2]);
        assert_eq!(
            store.get_by_id(1).map(|p| p.prototype_nm),
            Some("Prototype 1".to_string())
        );
    }

    #[test]
    fn test_size_is_measured_after_dropping_duplicates() {
        let store = SnapshotStore::with_defaults();
        let mut records = prototypes(&[1, 2]);
        let expected_bytes = serde_json::to_vec(&records).unwrap().len();
        let mut dup = prototype(2);
        dup.summary = "z".repeat(500);
        records.push(dup);

        let outcome = store.replace(records);
        assert_eq!(
            outcome,
            ReplaceOutcome::Applied {
                records: 2,
                size_bytes: expected_bytes
            }
        );
        assert_eq!(store.get_stats().approx_size_bytes, expected_bytes);
    }

    #[test]
    fn test_duplicates_do_not_count_against_ceiling() {
        let records = prototypes(&[1]);
        let limit = serde_json::to_vec(&records).unwrap().len();
        let config = SnapshotStoreConfig::new().with_max_data_size(limit);
        let store = SnapshotStore::new(config).unwrap();

        let outcome = store.replace(vec![prototype(1), prototype(1), prototype(1)]);
        assert!(outcome.is_applied());
        assert_eq!(store.ids(), vec![1]);
    }

    #[test]
    fn test_get_all_is_a_stable_view() {
        let store = SnapshotStore::with_defaults();
        store.replace(prototypes(&[1, 2]));
        let view = store.get_all();
        store.replace(prototypes(&[5]));

        assert_eq!(view.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(store.ids(), vec![5]);
    }

    #[test]
    fn test_get_random_returns_member() {
        let store = SnapshotStore::with_defaults();
        store.replace(prototypes(&[7, 8, 9]));
        for _ in 0..20 {
            let pick = store.get_random().expect("non-empty store");
            assert!([7, 8, 9].contains(&pick.id));
        }
    }

    #[test]
    fn test_expiry_follows_ttl() {
        let config = SnapshotStoreConfig::new().with_ttl(Duration::from_secs(60));
        let store = SnapshotStore::new(config).unwrap();
        store.replace(prototypes(&[1]));
        let cached_at = store.cached_at().expect("populated");

        assert!(!store.is_expired_at(cached_at + chrono::Duration::seconds(60)));
        assert!(store.is_expired_at(cached_at + chrono::Duration::seconds(61)));
    }

    #[test]
    fn test_stats_expiry_agrees_with_cached_at() {
        let config = SnapshotStoreConfig::new().with_ttl(Duration::from_secs(60));
        let store = SnapshotStore::new(config).unwrap();

        let empty = store.get_stats();
        assert!(empty.cached_at.is_none() && empty.is_expired);

        store.replace(prototypes(&[1]));
        let stats = store.get_stats();
        assert!(stats.cached_at.is_some());
        assert!(!stats.is_expired);
    }

    #[test]
    fn test_stats_report_size_and_bytes() {
        let store = SnapshotStore::with_defaults();
        let records = prototypes(&[1, 2]);
        let expected_bytes = serde_json::to_vec(&records).unwrap().len();
        store.replace(records);

        let stats = store.get_stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.approx_size_bytes, expected_bytes);
        assert_eq!(stats.max_id, Some(2));
        assert!(!stats.is_expired);
    }
}
