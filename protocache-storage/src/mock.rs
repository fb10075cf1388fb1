//! Scripted fetcher for tests.
//!
//! Responses are served in FIFO order; once the script runs dry every call
//! resolves with an empty batch. A gated fetcher parks each call until the
//! test releases it, which keeps a refresh in flight for as long as needed.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use protocache_core::{ApiError, FetchError, FetchQuery, UpstreamRecord};
use tokio::sync::Semaphore;

use crate::fetcher::{FetchResponse, PrototypeFetcher};

type Scripted = Result<FetchResponse, FetchError>;

/// Mock fetcher with a response script and call accounting.
#[derive(Debug, Default)]
pub struct MockFetcher {
    script: Mutex<VecDeque<Scripted>>,
    queries: Mutex<Vec<FetchQuery>>,
    calls: AtomicUsize,
    gate: Option<Semaphore>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fetcher whose calls wait until [`release`](Self::release) is called.
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    /// Queue a successful batch.
    pub fn push_records(&self, records: Vec<UpstreamRecord>) -> &Self {
        self.push(Ok(FetchResponse::ok(records)))
    }

    /// Queue an `{ok: false}` result.
    pub fn push_failed(&self, error: ApiError) -> &Self {
        self.push(Ok(FetchResponse::Failed(error)))
    }

    /// Queue a rejection.
    pub fn push_error(&self, error: FetchError) -> &Self {
        self.push(Err(error))
    }

    fn push(&self, scripted: Scripted) -> &Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(scripted);
        self
    }

    /// Let `n` parked calls proceed.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Number of times the fetcher was invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Queries received, in call order.
    pub fn queries(&self) -> Vec<FetchQuery> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PrototypeFetcher for MockFetcher {
    async fn fetch_records(&self, query: &FetchQuery) -> Result<FetchResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*query);

        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| FetchError::other(format!("mock gate closed: {}", e)))?;
            permit.forget();
        }

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        next.unwrap_or_else(|| Ok(FetchResponse::ok(Vec::new())))
    }
}
