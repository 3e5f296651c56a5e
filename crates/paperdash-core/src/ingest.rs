//! Capture time encoded in snapshot file names (`YYYYMMDDHH.parquet`).

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

/// Extension every snapshot object carries.
pub const SNAPSHOT_EXTENSION: &str = ".parquet";

/// Parse the capture hour from a snapshot file name or path.
pub fn parse_ingest_time(filename: &str) -> Option<NaiveDateTime> {
    let basename = Path::new(filename).file_name()?.to_str()?;
    let stem = basename.strip_suffix(SNAPSHOT_EXTENSION)?;
    if stem.len() != 10 || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let date = NaiveDate::parse_from_str(&stem[..8], "%Y%m%d").ok()?;
    let hour: u32 = stem[8..].parse().ok()?;
    date.and_hms_opt(hour, 0, 0)
}

/// Human label for the capture time, or `"N/A"`.
pub fn ingest_label(filename: Option<&str>) -> String {
    filename
        .and_then(parse_ingest_time)
        .map(|ts| ts.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}
