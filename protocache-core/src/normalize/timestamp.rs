//! Upstream timestamp normalization.
//!
//! The upstream emits timestamps such as `2024-01-15 12:34:56` with no offset,
//! meaning Japan Standard Time. Canonical output is UTC with millisecond
//! precision: `2024-01-15T03:34:56.000Z`.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Offset assumed for timestamps that carry no explicit zone.
pub const UPSTREAM_UTC_OFFSET_HOURS: i64 = 9;

const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

static EXPLICIT_ZONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(z|[+-]\d{2}(:?\d{2})?)$").expect("valid zone regex"));

static LOCAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})[ T](\d{2}):(\d{2}):(\d{2})(?:\.(\d+))?$")
        .expect("valid local timestamp regex")
});

/// Offset-carrying layouts accepted besides RFC 3339.
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
];

/// Normalize an upstream timestamp to UTC ISO-8601.
///
/// Returns `None` for absent or blank input and for anything that cannot be
/// read as either a zoned timestamp or a local `YYYY-MM-DD[ T]HH:MM:SS[.f]`.
pub fn normalize_timestamp(value: Option<&str>) -> Option<String> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }

    if EXPLICIT_ZONE.is_match(raw) {
        if let Some(parsed) = parse_zoned(raw) {
            return Some(format_utc(parsed));
        }
    }

    parse_local(raw).map(format_utc)
}

fn parse_zoned(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ZONED_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(raw, format).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
}

fn parse_local(raw: &str) -> Option<DateTime<Utc>> {
    let caps = LOCAL_PATTERN.captures(raw)?;
    let field = |idx: usize| caps.get(idx)?.as_str().parse::<u32>().ok();

    let year = i32::try_from(field(1)?).ok()?;
    let date = NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)?;
    let time = NaiveTime::from_hms_milli_opt(
        field(4)?,
        field(5)?,
        field(6)?,
        fraction_millis(caps.get(7).map(|m| m.as_str())),
    )?;

    let local = NaiveDateTime::new(date, time);
    let utc = local.checked_sub_signed(Duration::hours(UPSTREAM_UTC_OFFSET_HOURS))?;
    Some(utc.and_utc())
}

/// Pad or truncate a fractional-seconds string to milliseconds.
fn fraction_millis(fraction: Option<&str>) -> u32 {
    let Some(digits) = fraction else {
        return 0;
    };
    digits
        .chars()
        .chain(std::iter::repeat('0'))
        .take(3)
        .filter_map(|c| c.to_digit(10))
        .fold(0, |acc, d| acc * 10 + d)
}

fn format_utc(instant: DateTime<Utc>) -> String {
    instant.format(CANONICAL_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_local_time_is_shifted_to_utc() {
        assert_eq!(
            normalize_timestamp(Some("2024-01-15 12:34:56")).as_deref(),
            Some("2024-01-15T03:34:56.000Z")
        );
    }

    #[test]
    fn test_local_time_crosses_midnight() {
        assert_eq!(
            normalize_timestamp(Some("2024-03-01T05:00:00")).as_deref(),
            Some("2024-02-29T20:00:00.000Z")
        );
    }

    #[test]
    fn test_blank_input_is_none() {
        assert_eq!(normalize_timestamp(Some("")), None);
        assert_eq!(normalize_timestamp(Some("   ")), None);
        assert_eq!(normalize_timestamp(None), None);
    }

    #[test]
    fn test_fraction_is_padded_and_truncated() {
        assert_eq!(
            normalize_timestamp(Some("2024-01-15 12:34:56.5")).as_deref(),
            Some("2024-01-15T03:34:56.500Z")
        );
        assert_eq!(
            normalize_timestamp(Some("2024-01-15 12:34:56.123456")).as_deref(),
            Some("2024-01-15T03:34:56.123Z")
        );
    }

    #[test]
    fn test_explicit_utc_marker_is_respected() {
        assert_eq!(
            normalize_timestamp(Some("2024-01-15T12:34:56Z")).as_deref(),
            Some("2024-01-15T12:34:56.000Z")
        );
    }

    #[test]
    fn test_explicit_offset_is_respected() {
        assert_eq!(
            normalize_timestamp(Some("2024-01-15T12:34:56+09:00")).as_deref(),
            Some("2024-01-15T03:34:56.000Z")
        );
        assert_eq!(
            normalize_timestamp(Some("2024-01-15T12:34:56.250-0500")).as_deref(),
            Some("2024-01-15T17:34:56.250Z")
        );
    }

    #[test]
    fn test_unparseable_input_is_none() {
        assert_eq!(normalize_timestamp(Some("not a date")), None);
        assert_eq!(normalize_timestamp(Some("2024-01-15")), None);
        assert_eq!(normalize_timestamp(Some("2024-13-01 00:00:00")), None);
        assert_eq!(normalize_timestamp(Some("2024-02-30 00:00:00")), None);
        assert_eq!(normalize_timestamp(Some("2024-01-15 25:00:00")), None);
        assert_eq!(normalize_timestamp(Some("2024-01-15T99:00:00Z")), None);
    }

    #[test]
    fn test_normalization_is_deterministic() {
        let input = Some("2023-07-07 07:07:07.7");
        assert_eq!(normalize_timestamp(input), normalize_timestamp(input));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_local_time_matches_utc_minus_nine_hours(
            year in 1970i32..2100,
            month in 1u32..=12,
            day in 1u32..=28,
            hour in 0u32..24,
            minute in 0u32..60,
            second in 0u32..60,
            millis in 0u32..1000,
            separator in prop::sample::select(vec![' ', 'T']),
        ) {
            let input = format!(
                "{:04}-{:02}-{:02}{}{:02}:{:02}:{:02}.{:03}",
                year, month, day, separator, hour, minute, second, millis
            );

            let expected = NaiveDate::from_ymd_opt(year, month, day)
                .and_then(|d| d.and_hms_milli_opt(hour, minute, second, millis))
                .map(|local| (local - Duration::hours(9)).and_utc());
            prop_assume!(expected.is_some());
            let expected = expected.map(|utc| utc.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string());

            let actual = normalize_timestamp(Some(&input));
            prop_assert_eq!(&actual, &expected);

            let rendered = actual.unwrap_or_default();
            prop_assert!(rendered.ends_with('Z'));
            let fraction = rendered.rsplit('.').next().unwrap_or_default();
            prop_assert_eq!(fraction.len(), 4);
        }
    }
}
