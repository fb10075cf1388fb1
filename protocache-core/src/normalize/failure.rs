//! Fetcher errors to uniform failure descriptors.
//!
//! Classification runs first-match-wins: timeout, structured API error,
//! HTTP-shaped error, then a generic fallback. The normalizer never fails and
//! logs every descriptor it produces.

use crate::{
    ApiError, FailureDetail, FetchError, HttpErrorShape, RequestDetail, ResponseDetail,
    UpstreamFailure,
};

/// Message reported for aborted requests.
pub const TIMEOUT_MESSAGE: &str = "Upstream request timed out";

/// Message reported when the error carries none of its own.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to fetch prototypes from upstream";

const TIMEOUT_STATUS: u16 = 504;
const FALLBACK_STATUS: u16 = 500;

/// Convert any fetcher error into an [`UpstreamFailure`].
pub fn normalize_failure(err: &FetchError) -> UpstreamFailure {
    let failure = match err {
        FetchError::Timeout => UpstreamFailure::new(TIMEOUT_STATUS, TIMEOUT_MESSAGE),
        FetchError::Api(api) => from_api_error(api),
        FetchError::Http(shape) => from_http_shape(shape),
        FetchError::Other { message } => {
            UpstreamFailure::new(FALLBACK_STATUS, message_or_generic(message))
        }
    };

    tracing::error!(
        status_code = failure.status_code,
        message = %failure.message,
        detail = ?failure.detail,
        "Upstream fetch failed"
    );

    failure
}

fn from_api_error(api: &ApiError) -> UpstreamFailure {
    let request = (api.method.is_some() || api.url.is_some()).then(|| RequestDetail {
        method: api.method.clone(),
        url: api.url.clone(),
    });
    let response = api.status_text.as_ref().map(|status_text| ResponseDetail {
        status_text: Some(status_text.clone()),
        code: None,
    });

    UpstreamFailure::new(api.status, api.message.clone())
        .with_detail(FailureDetail { request, response })
}

fn from_http_shape(shape: &HttpErrorShape) -> UpstreamFailure {
    let status_code = shape
        .status
        .as_ref()
        .and_then(coerce_status)
        .unwrap_or(FALLBACK_STATUS);

    let request = (shape.method.is_some() || shape.url.is_some()).then(|| RequestDetail {
        method: shape.method.clone(),
        url: shape.url.clone(),
    });
    let response = (shape.status_text.is_some() || shape.code.is_some()).then(|| ResponseDetail {
        status_text: shape.status_text.clone(),
        code: shape.code.clone(),
    });

    UpstreamFailure::new(status_code, message_or_generic(&shape.message))
        .with_detail(FailureDetail { request, response })
}

/// Coerce a status-like JSON value to a status code.
///
/// Numbers and numeric strings are accepted; fractions are truncated.
/// Non-finite, negative or out-of-range values yield `None`.
fn coerce_status(value: &serde_json::Value) -> Option<u16> {
    let numeric = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !numeric.is_finite() {
        return None;
    }
    let truncated = numeric.trunc();
    (0.0..=f64::from(u16::MAX))
        .contains(&truncated)
        .then_some(truncated as u16)
}

fn message_or_generic(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(GENERIC_FAILURE_MESSAGE)
        .to_string()
}
