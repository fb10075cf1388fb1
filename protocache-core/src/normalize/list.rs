//! Delimited list fields.

/// Delimiter used by the upstream for list-valued fields.
pub const LIST_DELIMITER: char = '|';

/// Split a pipe-delimited upstream field.
///
/// Absent or empty input yields an empty list. Segments are trimmed and empty
/// segments dropped, so consecutive, leading and trailing delimiters vanish.
pub fn split_list(value: Option<&str>) -> Vec<String> {
    split_list_with(value, LIST_DELIMITER)
}

/// Split on an arbitrary delimiter with the same trimming rules as [`split_list`].
pub fn split_list_with(value: Option<&str>, delimiter: char) -> Vec<String> {
    match value {
        Some(raw) if !raw.is_empty() => raw
            .split(delimiter)
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
