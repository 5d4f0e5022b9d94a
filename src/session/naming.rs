use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::path::{Path, PathBuf};

/// Timestamp layout used in recording file names (yyyyMMdd_HHmmss)
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Build `<dir>/<prefix><yyyyMMdd_HHmmss>.<ext>`
pub fn recording_path<Tz>(
    output_dir: &Path,
    prefix: &str,
    started_at: &DateTime<Tz>,
    extension: &str,
) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    output_dir.join(format!(
        "{}{}.{}",
        prefix,
        started_at.format(TIMESTAMP_FORMAT),
        extension
    ))
}

/// Check a file name against the `<prefix><yyyyMMdd_HHmmss>.<ext>` layout
pub fn is_recording_name(file_name: &str, prefix: &str) -> bool {
    let Some(rest) = file_name.strip_prefix(prefix) else {
        return false;
    };
    let Some((stamp, ext)) = rest.split_once('.') else {
        return false;
    };

    let bytes = stamp.as_bytes();
    stamp.len() == 15
        && bytes[8] == b'_'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 8 || b.is_ascii_digit())
        && !ext.is_empty()
        && ext.chars().all(|c| c.is_ascii_alphanumeric())
}
