//! Snapshot repository: coalescing refresh coordinator plus read API.
//!
//! At most one upstream fetch runs per repository. A refresh requested while
//! one is in flight joins it and receives the same outcome, whatever
//! parameters it asked for.
//!
//! ```text
//! ensure_snapshot ─┐
//!                  │                         ┌──────────┐
//! ensure_snapshot ─┼──► in-flight slot ─────►│ Fetcher  │ (one call)
//!                  │        │                └────┬─────┘
//! force_refresh  ──┘        │                     ▼
//!                           │          normalize + SnapshotStore::replace
//!                           ▼                     │
//!                  [all callers receive  ◄────────┘
//!                   the same Result]
//! ```
//!
//! The fetch runs on its own tokio task, so it completes and applies its
//! result even when every caller waiting on it has been dropped. The slot
//! holds a [`Shared`] handle to that task and is checked-and-set inside one
//! synchronous critical section before anything awaits. Reads go straight to
//! the [`SnapshotStore`] and never wait on the network.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use protocache_core::{
    normalize_failure, normalize_records, ConfigError, FetchError, FetchParams, FetchQuery,
    Prototype, PrototypeId, SnapshotStoreConfig, UpstreamFailure,
};
use tokio::task::JoinError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::fetcher::{FetchResponse, PrototypeFetcher};
use crate::snapshot::{ReplaceOutcome, SnapshotAnalysis, SnapshotStats, SnapshotStore};

/// Outcome delivered to every caller of one refresh.
pub type RefreshResult = Result<SnapshotStats, UpstreamFailure>;

type SharedRefresh = Shared<BoxFuture<'static, RefreshResult>>;

/// Statistics for monitoring coalescing effectiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoalescingStats {
    /// Refresh requests received.
    pub total_requests: u64,
    /// Requests that joined an in-flight fetch.
    pub coalesced_requests: u64,
    /// Requests that started a fetch.
    pub new_requests: u64,
}

impl CoalescingStats {
    /// Returns the coalescing ratio (0.0 to 1.0)
    pub fn coalescing_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.coalesced_requests as f64 / self.total_requests as f64
        }
    }
}

struct InFlight {
    generation: u64,
    query: FetchQuery,
    future: SharedRefresh,
}

#[derive(Default)]
struct CoordinatorState {
    in_flight: Option<InFlight>,
    last_query: Option<FetchQuery>,
    next_generation: u64,
    stats: CoalescingStats,
}

struct Inner<F> {
    fetcher: F,
    store: SnapshotStore,
    state: Mutex<CoordinatorState>,
}

impl<F: PrototypeFetcher> Inner<F> {
    fn lock_state(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fetch_and_store(&self, query: FetchQuery) -> RefreshResult {
        let records = self
            .fetcher
            .fetch_records(&query)
            .await
            .and_then(FetchResponse::into_result)
            .map_err(|err| normalize_failure(&err))?;

        let prototypes = normalize_records(&records);
        if let ReplaceOutcome::Applied { records, size_bytes } = self.store.replace(prototypes) {
            debug!(
                records,
                size_bytes,
                offset = query.offset,
                limit = query.limit,
                "Refresh applied"
            );
        }

        Ok(self.store.get_stats())
    }

    /// Return the slot to idle if it still holds this generation.
    fn finish(&self, generation: u64) {
        let mut state = self.lock_state();
        if state
            .in_flight
            .as_ref()
            .is_some_and(|op| op.generation == generation)
        {
            state.in_flight = None;
        }
    }
}

/// Releases the in-flight slot when the refresh task ends, including by panic.
struct SlotRelease<F: PrototypeFetcher> {
    inner: Arc<Inner<F>>,
    generation: u64,
}

impl<F: PrototypeFetcher> Drop for SlotRelease<F> {
    fn drop(&mut self) {
        self.inner.finish(self.generation);
    }
}

fn task_failure(err: JoinError) -> UpstreamFailure {
    normalize_failure(&FetchError::other(format!("refresh task failed: {}", err)))
}

/// Cached view of the upstream prototype catalogue.
///
/// Cloning is cheap; clones share the store, the fetcher and the in-flight
/// slot.
pub struct SnapshotRepository<F> {
    inner: Arc<Inner<F>>,
}

impl<F> SnapshotRepository<F>
where
    F: PrototypeFetcher + 'static,
{
    /// Create a repository with a fresh store.
    ///
    /// Fails when the store configuration is invalid.
    pub fn new(fetcher: F, config: SnapshotStoreConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_store(fetcher, SnapshotStore::new(config)?))
    }

    /// Create a repository over an existing (usually empty) store.
    pub fn with_store(fetcher: F, store: SnapshotStore) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                store,
                state: Mutex::new(CoordinatorState::default()),
            }),
        }
    }

    // ========================================================================
    // Refresh operations
    // ========================================================================

    /// Fetch with `params` merged over `{offset: 0, limit: 10}` and replace
    /// the snapshot.
    ///
    /// The merged parameters are remembered for later [`force_refresh`]
    /// calls. If a fetch is already in flight this call joins it instead.
    /// Dropping the returned future does not cancel the fetch.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// [`force_refresh`]: Self::force_refresh
    pub async fn ensure_snapshot(&self, params: FetchParams) -> RefreshResult {
        self.join_or_start(Some(params.resolve())).await
    }

    /// Re-run the last remembered parameters, or the defaults.
    pub async fn force_refresh(&self) -> RefreshResult {
        self.join_or_start(None).await
    }

    /// Refresh only when the snapshot has expired.
    pub async fn ensure_fresh(&self) -> RefreshResult {
        if !self.inner.store.is_expired() {
            return Ok(self.inner.store.get_stats());
        }
        self.force_refresh().await
    }

    fn join_or_start(&self, requested: Option<FetchQuery>) -> SharedRefresh {
        let mut state = self.inner.lock_state();
        state.stats.total_requests += 1;
        if let Some(query) = requested {
            state.last_query = Some(query);
        }

        if let Some(op) = state.in_flight.as_ref() {
            let future = op.future.clone();
            let generation = op.generation;
            let running = op.query;
            state.stats.coalesced_requests += 1;
            debug!(
                generation,
                offset = running.offset,
                limit = running.limit,
                coalesced = state.stats.coalesced_requests,
                "Joining in-flight refresh"
            );
            return future;
        }

        let query = state.last_query.unwrap_or_default();
        let generation = state.next_generation;
        state.next_generation += 1;
        state.stats.new_requests += 1;

        let release = SlotRelease {
            inner: Arc::clone(&self.inner),
            generation,
        };
        let task = tokio::spawn(async move {
            let result = release.inner.fetch_and_store(query).await;
            drop(release);
            result
        });
        let future = task
            .map(|joined| joined.unwrap_or_else(|err| Err(task_failure(err))))
            .boxed()
            .shared();

        info!(
            generation,
            offset = query.offset,
            limit = query.limit,
            record_id = ?query.record_id,
            "Starting upstream refresh"
        );
        state.in_flight = Some(InFlight {
            generation,
            query,
            future: future.clone(),
        });
        future
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn get_by_id(&self, id: PrototypeId) -> Option<Prototype> {
        self.inner.store.get_by_id(id)
    }

    pub fn get_all(&self) -> Arc<Vec<Prototype>> {
        self.inner.store.get_all()
    }

    pub fn get_random_one(&self) -> Option<Prototype> {
        self.inner.store.get_random()
    }

    /// Up to `n` distinct records in random order.
    ///
    /// `n` is clamped to the snapshot size; zero or an empty snapshot yields
    /// an empty list.
    pub fn get_random_sample(&self, n: usize) -> Vec<Prototype> {
        let records = self.inner.store.get_all();
        let amount = n.min(records.len());
        if amount == 0 {
            return Vec::new();
        }
        rand::seq::index::sample(&mut rand::rng(), records.len(), amount)
            .into_iter()
            .filter_map(|idx| records.get(idx).cloned())
            .collect()
    }

    pub fn get_all_ids(&self) -> Vec<PrototypeId> {
        self.inner.store.ids()
    }

    /// Smallest and largest id present.
    pub fn analyze(&self) -> SnapshotAnalysis {
        SnapshotAnalysis::from_ids(self.inner.store.ids())
    }

    pub fn get_stats(&self) -> SnapshotStats {
        self.inner.store.get_stats()
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn store(&self) -> &SnapshotStore {
        &self.inner.store
    }

    pub fn fetcher(&self) -> &F {
        &self.inner.fetcher
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.lock_state().in_flight.is_some()
    }

    /// Parameters the next [`force_refresh`](Self::force_refresh) will use.
    pub fn last_query(&self) -> FetchQuery {
        self.inner.lock_state().last_query.unwrap_or_default()
    }

    pub fn coalescing_stats(&self) -> CoalescingStats {
        self.inner.lock_state().stats
    }
}

impl<F> Clone for SnapshotRepository<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
