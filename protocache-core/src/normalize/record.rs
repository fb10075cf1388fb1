//! Upstream record to canonical prototype.

use crate::{Prototype, UpstreamRecord};

use super::list::split_list;
use super::timestamp::normalize_timestamp;

const DEFAULT_RELEASE_FLG: i64 = 2;
const DEFAULT_REVISION: i64 = 0;
const DEFAULT_LICENSE_TYPE: i64 = 1;
const DEFAULT_THANKS_FLG: i64 = 0;

/// Map one upstream record into the canonical shape.
///
/// Structural mapping only: values are not validated or coerced beyond the
/// list splitting, timestamp normalization and flag defaults.
pub fn normalize_record(record: &UpstreamRecord) -> Prototype {
    Prototype {
        id: record.id,
        uuid: text(&record.uuid),
        nid: record.nid.clone(),
        status: record.status,
        prototype_nm: text(&record.prototype_nm),
        summary: text(&record.summary),
        free_comment: text(&record.free_comment),
        system_description: text(&record.system_description),
        team_nm: text(&record.team_nm),

        tags: split_list(record.tags.as_deref()),
        users: split_list(record.users.as_deref()),
        materials: split_list(record.materials.as_deref()),
        events: split_list(record.events.as_deref()),
        awards: split_list(record.awards.as_deref()),

        view_count: record.view_count,
        good_count: record.good_count,
        comment_count: record.comment_count,

        release_flg: record.release_flg.unwrap_or(DEFAULT_RELEASE_FLG),
        revision: record.revision.unwrap_or(DEFAULT_REVISION),
        license_type: record.license_type.unwrap_or(DEFAULT_LICENSE_TYPE),
        thanks_flg: record.thanks_flg.unwrap_or(DEFAULT_THANKS_FLG),

        create_date: timestamp(record.id, "createDate", &record.create_date),
        update_date: timestamp(record.id, "updateDate", &record.update_date),
        release_date: timestamp(record.id, "releaseDate", &record.release_date),

        create_id: record.create_id,
        update_id: record.update_id,
        slide_mode: record.slide_mode,

        main_url: record.main_url.clone(),
        video_url: record.video_url.clone(),
        official_link: record.official_link.clone(),
        related_link: record.related_link.clone(),
    }
}

/// Normalize a batch, preserving upstream order.
pub fn normalize_records(records: &[UpstreamRecord]) -> Vec<Prototype> {
    records.iter().map(normalize_record).collect()
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Normalized timestamp, or the upstream string verbatim when it cannot be parsed.
fn timestamp(id: i64, field: &'static str, value: &Option<String>) -> Option<String> {
    match normalize_timestamp(value.as_deref()) {
        Some(normalized) => Some(normalized),
        None => {
            if let Some(raw) = value {
                tracing::debug!(
                    prototype_id = id,
                    field,
                    raw = %raw,
                    "Keeping unparseable timestamp verbatim"
                );
            }
            value.clone()
        }
    }
}
