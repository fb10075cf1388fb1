//! Error types for PROTOCACHE operations

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// CONFIGURATION ERRORS
// ============================================================================

/// Configuration errors, raised at construction time.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

// ============================================================================
// FETCHER BOUNDARY
// ============================================================================

/// Structured error reported by the upstream API itself.
///
/// This is what the fetcher hands back for an `{ok: false}` result, and what
/// it may reject with when the upstream client raises its own error type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    pub method: Option<String>,
    pub url: Option<String>,
    pub status_text: Option<String>,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            method: None,
            url: None,
            status_text: None,
        }
    }

    pub fn with_request(mut self, method: impl Into<String>, url: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self.url = Some(url.into());
        self
    }

    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = Some(status_text.into());
        self
    }
}

/// An HTTP-shaped error of unknown provenance.
///
/// The status is kept as raw JSON because such errors carry it as a number,
/// a numeric string, or garbage; the error normalizer coerces it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpErrorShape {
    pub status: Option<serde_json::Value>,
    pub message: Option<String>,
    pub method: Option<String>,
    pub url: Option<String>,
    pub status_text: Option<String>,
    pub code: Option<String>,
}

/// Everything a fetcher can fail with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// The request was aborted because it exceeded the fetcher's deadline.
    #[error("request timed out")]
    Timeout,

    #[error("upstream API error {}: {}", .0.status, .0.message)]
    Api(ApiError),

    #[error("HTTP error: {}", .0.message.as_deref().unwrap_or("no message"))]
    Http(HttpErrorShape),

    #[error("fetch failed: {}", .message.as_deref().unwrap_or("unknown error"))]
    Other { message: Option<String> },
}

impl FetchError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: Some(message.into()),
        }
    }
}

impl From<ApiError> for FetchError {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}

// ============================================================================
// NORMALIZED FAILURE DESCRIPTOR
// ============================================================================

/// Request half of a failure's detail.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Response half of a failure's detail.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Optional diagnostic detail. Always present on a failure, possibly empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseDetail>,
}

impl FailureDetail {
    pub fn is_empty(&self) -> bool {
        self.request.is_none() && self.response.is_none()
    }
}

/// Uniform failure descriptor for every upstream error path.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("Upstream failure ({status_code}): {message}")]
pub struct UpstreamFailure {
    pub status_code: u16,
    pub message: String,
    pub detail: FailureDetail,
}

impl UpstreamFailure {
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            detail: FailureDetail::default(),
        }
    }

    pub fn with_detail(mut self, detail: FailureDetail) -> Self {
        self.detail = detail;
        self
    }

    /// True for the gateway-timeout produced by an aborted request.
    pub fn is_timeout(&self) -> bool {
        self.status_code == 504
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }
}

// ============================================================================
// MASTER ERROR
// ============================================================================

/// Master error type for all PROTOCACHE errors.
#[derive(Debug, Clone, Error)]
pub enum ProtocacheError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Upstream(#[from] UpstreamFailure),
}

/// Result type alias for PROTOCACHE operations.
pub type ProtocacheResult<T> = Result<T, ProtocacheError>;
