//! Core entity structures

use serde::{Deserialize, Serialize};

/// Upstream prototype identifier.
pub type PrototypeId = i64;

/// Offset applied when the caller does not provide one.
pub const DEFAULT_FETCH_OFFSET: u32 = 0;

/// Page size applied when the caller does not provide one.
pub const DEFAULT_FETCH_LIMIT: u32 = 10;

// ============================================================================
// UPSTREAM RECORD
// ============================================================================

/// A prototype record exactly as the upstream API returns it.
///
/// Only the fields the normalizer reads are modelled. Everything except `id`
/// is optional because the upstream omits or nulls fields freely. List fields
/// arrive as pipe-delimited strings and timestamps arrive in local time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamRecord {
    pub id: PrototypeId,
    pub uuid: Option<String>,
    pub nid: Option<String>,
    pub status: Option<i64>,
    pub prototype_nm: Option<String>,
    pub summary: Option<String>,
    pub free_comment: Option<String>,
    pub system_description: Option<String>,
    pub team_nm: Option<String>,

    // Pipe-delimited lists
    pub tags: Option<String>,
    pub users: Option<String>,
    pub materials: Option<String>,
    pub events: Option<String>,
    pub awards: Option<String>,

    // Counters
    pub view_count: Option<i64>,
    pub good_count: Option<i64>,
    pub comment_count: Option<i64>,

    // Flags with per-field defaults
    pub release_flg: Option<i64>,
    pub revision: Option<i64>,
    pub license_type: Option<i64>,
    pub thanks_flg: Option<i64>,

    // Local-time timestamps
    pub create_date: Option<String>,
    pub update_date: Option<String>,
    pub release_date: Option<String>,

    pub create_id: Option<i64>,
    pub update_id: Option<i64>,
    pub slide_mode: Option<i64>,

    // URLs
    pub main_url: Option<String>,
    pub video_url: Option<String>,
    pub official_link: Option<String>,
    pub related_link: Option<String>,
}

impl UpstreamRecord {
    /// Create a record carrying only an id; every other field is absent.
    pub fn with_id(id: PrototypeId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}

// ============================================================================
// CANONICAL PROTOTYPE
// ============================================================================

/// Canonical prototype record served from the snapshot.
///
/// Text fields are never absent, list fields are always arrays, flags carry
/// their documented defaults and timestamps are UTC ISO-8601 whenever the
/// upstream value could be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prototype {
    pub id: PrototypeId,
    pub uuid: String,
    pub nid: Option<String>,
    pub status: Option<i64>,
    pub prototype_nm: String,
    pub summary: String,
    pub free_comment: String,
    pub system_description: String,
    pub team_nm: String,

    pub tags: Vec<String>,
    pub users: Vec<String>,
    pub materials: Vec<String>,
    pub events: Vec<String>,
    pub awards: Vec<String>,

    pub view_count: Option<i64>,
    pub good_count: Option<i64>,
    pub comment_count: Option<i64>,

    pub release_flg: i64,
    pub revision: i64,
    pub license_type: i64,
    pub thanks_flg: i64,

    /// UTC ISO-8601, or the upstream string verbatim when unparseable.
    pub create_date: Option<String>,
    pub update_date: Option<String>,
    pub release_date: Option<String>,

    pub create_id: Option<i64>,
    pub update_id: Option<i64>,
    pub slide_mode: Option<i64>,

    pub main_url: Option<String>,
    pub video_url: Option<String>,
    pub official_link: Option<String>,
    pub related_link: Option<String>,
}

// ============================================================================
// FETCH PARAMETERS
// ============================================================================

/// Caller-supplied fetch parameters; absent values take the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchParams {
    pub offset: Option<u32>,
    pub limit: Option<u32>,
    pub record_id: Option<PrototypeId>,
}

impl FetchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_record_id(mut self, record_id: PrototypeId) -> Self {
        self.record_id = Some(record_id);
        self
    }

    /// Merge with the defaults `{offset: 0, limit: 10}`.
    pub fn resolve(self) -> FetchQuery {
        FetchQuery {
            offset: self.offset.unwrap_or(DEFAULT_FETCH_OFFSET),
            limit: self.limit.unwrap_or(DEFAULT_FETCH_LIMIT),
            record_id: self.record_id,
        }
    }
}

/// Fully resolved parameters handed to the fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchQuery {
    pub offset: u32,
    pub limit: u32,
    pub record_id: Option<PrototypeId>,
}

impl Default for FetchQuery {
    fn default() -> Self {
        FetchParams::default().resolve()
    }
}

impl From<FetchParams> for FetchQuery {
    fn from(params: FetchParams) -> Self {
        params.resolve()
    }
}
