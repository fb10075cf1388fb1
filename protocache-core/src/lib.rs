//! PROTOCACHE Core - Canonical Types and Normalizers
//!
//! Pure data structures plus the normalization pipeline that turns loosely
//! typed upstream prototype records into the canonical [`Prototype`] shape.
//! Nothing in this crate performs I/O or awaits; the snapshot store and the
//! refresh coordinator live in `protocache-storage`.

pub mod config;
pub mod entities;
pub mod error;
pub mod normalize;

pub use config::{SnapshotStoreConfig, DEFAULT_TTL, HARD_MAX_DATA_SIZE_BYTES};
pub use entities::{
    FetchParams, FetchQuery, Prototype, PrototypeId, UpstreamRecord, DEFAULT_FETCH_LIMIT,
    DEFAULT_FETCH_OFFSET,
};
pub use error::{
    ApiError, ConfigError, FailureDetail, FetchError, HttpErrorShape, ProtocacheError,
    ProtocacheResult, RequestDetail, ResponseDetail, UpstreamFailure,
};
pub use normalize::{
    normalize_failure, normalize_record, normalize_records, normalize_timestamp, split_list,
    split_list_with, LIST_DELIMITER, UPSTREAM_UTC_OFFSET_HOURS,
};
