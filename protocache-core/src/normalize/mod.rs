//! Normalization pipeline for upstream payloads.
//!
//! - [`timestamp`]: local-time upstream timestamps to UTC ISO-8601
//! - [`list`]: pipe-delimited fields to trimmed, non-empty segments
//! - [`record`]: one [`UpstreamRecord`](crate::UpstreamRecord) to one
//!   [`Prototype`](crate::Prototype)
//! - [`failure`]: any fetcher error to an [`UpstreamFailure`](crate::UpstreamFailure)

pub mod failure;
pub mod list;
pub mod record;
pub mod timestamp;

pub use failure::{normalize_failure, GENERIC_FAILURE_MESSAGE, TIMEOUT_MESSAGE};
pub use list::{split_list, split_list_with, LIST_DELIMITER};
pub use record::{normalize_record, normalize_records};
pub use timestamp::{normalize_timestamp, UPSTREAM_UTC_OFFSET_HOURS};
