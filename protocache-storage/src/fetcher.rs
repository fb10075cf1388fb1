//! Upstream fetcher collaborator.
//!
//! The HTTP client that talks to the prototype API lives outside this crate.
//! It plugs in through [`PrototypeFetcher`]; timeouts, retries and transport
//! concerns are its business.

use async_trait::async_trait;
use protocache_core::{ApiError, FetchError, FetchQuery, UpstreamRecord};

/// What a fetch resolves to when the transport itself succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResponse {
    /// `{ok: true, data}`
    Ok { data: Vec<UpstreamRecord> },
    /// `{ok: false, status, message, ...}`
    Failed(ApiError),
}

impl FetchResponse {
    pub fn ok(data: Vec<UpstreamRecord>) -> Self {
        Self::Ok { data }
    }

    /// Collapse both failure paths into one `Result`.
    pub fn into_result(self) -> Result<Vec<UpstreamRecord>, FetchError> {
        match self {
            Self::Ok { data } => Ok(data),
            Self::Failed(api) => Err(FetchError::Api(api)),
        }
    }
}

/// Fetcher trait for retrieving a batch of prototypes from upstream.
///
/// Implementations may either resolve with [`FetchResponse::Failed`] or reject
/// with a [`FetchError`]; the coordinator treats both the same way.
#[async_trait]
pub trait PrototypeFetcher: Send + Sync {
    async fn fetch_records(&self, query: &FetchQuery) -> Result<FetchResponse, FetchError>;
}

#[async_trait]
impl<F: PrototypeFetcher + ?Sized> PrototypeFetcher for std::sync::Arc<F> {
    async fn fetch_records(&self, query: &FetchQuery) -> Result<FetchResponse, FetchError> {
        (**self).fetch_records(query).await
    }
}
