//! Raw snapshot columns → canonical [`Record`]s.
//!
//! Nothing in here fails. A column that is missing, or whose Arrow type
//! cannot be coerced, degrades to the field default for every row; a single
//! unparseable cell degrades to the default for that row only.

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use crate::record::Record;
use crate::schema::snapshot as col;

/// Normalise every row of every batch, preserving row order.
pub fn normalize_batches(batches: &[RecordBatch]) -> Vec<Record> {
    if let Some(first) = batches.first() {
        let missing = col::missing_columns(&first.schema());
        if !missing.is_empty() {
            warn!(columns = ?missing, "snapshot lacks columns, using defaults");
        }
    }
    let total: usize = batches.iter().map(|b| b.num_rows()).sum();
    let mut records = Vec::with_capacity(total);
    for batch in batches {
        records.extend(normalize_batch(batch));
    }
    debug!(rows = records.len(), batches = batches.len(), "normalised snapshot");
    records
}

/// Normalise a single record batch.
pub fn normalize_batch(batch: &RecordBatch) -> Vec<Record> {
    let n = batch.num_rows();

    let mut ids = text_column(batch, col::ID);
    let mut titles = text_column(batch, col::TITLE);
    let mut abstracts = text_column(batch, col::ABSTRACT);
    let mut authors = list_column(batch, col::AUTHORS);
    let mut keywords = list_column(batch, col::KEYWORDS);
    let mut languages = text_column(batch, col::LANGUAGE);
    let mut categories = list_column(batch, col::CATEGORIES);
    let mut descriptions = text_column(batch, col::REPO_DESCRIPTION);
    let mut licenses = text_column(batch, col::LICENSE);
    let mut paper_urls = text_column(batch, col::PAPER_URL);
    let mut github_urls = text_column(batch, col::GITHUB_URL);

    let stars = count_column(batch, col::STARS);
    let stars_total = count_column(batch, col::STARS_TOTAL);
    let stars_7d = count_column(batch, col::STARS_LAST_7D);
    let stars_30d = count_column(batch, col::STARS_LAST_30D);
    let forks = count_column(batch, col::FORKS);
    let watchers = count_column(batch, col::WATCHERS);
    let open_issues = count_column(batch, col::OPEN_ISSUES);

    let created = time_column(batch, col::CREATED);
    let repo_created = time_column(batch, col::REPO_CREATED_AT);
    let repo_updated = time_column(batch, col::REPO_UPDATED_AT);

    (0..n)
        .map(|i| {
            Record {
                id: ids[i].take().unwrap_or_default(),
                title: titles[i].take().unwrap_or_default(),
                abstract_text: abstracts[i].take().unwrap_or_default(),
                authors: std::mem::take(&mut authors[i]),
                keywords: std::mem::take(&mut keywords[i]),
                language: non_blank(languages[i].take()),
                categories: std::mem::take(&mut categories[i]),
                repo_description: non_blank(descriptions[i].take()),
                stars: stars[i],
                stars_total: stars_total[i],
                stars_last_7d: stars_7d[i],
                stars_last_30d: stars_30d[i],
                forks: forks[i],
                watchers: watchers[i],
                open_issues: open_issues[i],
                created: created[i],
                repo_created_at: repo_created[i],
                repo_updated_at: repo_updated[i],
                paper_url: non_blank(paper_urls[i].take()),
                github_url: non_blank(github_urls[i].take()),
                license: non_blank(licenses[i].take()),
                ..Default::default()
            }
            .with_derived()
        })
        .collect()
}

/// Parse a textual timestamp into naive UTC.
///
/// Offsets are applied before the zone is dropped. A bare date means
/// midnight.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_utc());
        }
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ── Column readers ──

fn text_column(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
    let n = batch.num_rows();
    let Some(array) = batch.column_by_name(name) else {
        return vec![None; n];
    };
    match cast(array.as_ref(), &DataType::Utf8) {
        Ok(strings) => strings
            .as_string::<i32>()
            .iter()
            .map(|v| v.map(str::to_string))
            .collect(),
        Err(err) => {
            warn!(column = name, data_type = %array.data_type(), %err, "column is not text, using defaults");
            vec![None; n]
        }
    }
}

/// Sequence-valued column. Lists keep their non-null items; a plain string
/// column becomes one item per non-empty cell.
fn list_column(batch: &RecordBatch, name: &str) -> Vec<Vec<String>> {
    let n = batch.num_rows();
    let Some(array) = batch.column_by_name(name) else {
        return vec![Vec::new(); n];
    };

    if let Some(list) = array.as_list_opt::<i32>() {
        return (0..n)
            .map(|i| {
                if list.is_null(i) {
                    Vec::new()
                } else {
                    list_items(&list.value(i))
                }
            })
            .collect();
    }
    if let Some(list) = array.as_list_opt::<i64>() {
        return (0..n)
            .map(|i| {
                if list.is_null(i) {
                    Vec::new()
                } else {
                    list_items(&list.value(i))
                }
            })
            .collect();
    }

    text_column(batch, name)
        .into_iter()
        .map(|cell| non_blank(cell).into_iter().collect())
        .collect()
}

fn list_items(values: &ArrayRef) -> Vec<String> {
    match cast(values.as_ref(), &DataType::Utf8) {
        Ok(strings) => strings
            .as_string::<i32>()
            .iter()
            .flatten()
            .map(str::to_string)
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Non-negative counter column. Integers pass through, floats and numeric
/// strings are truncated, everything else is 0.
fn count_column(batch: &RecordBatch, name: &str) -> Vec<u64> {
    let n = batch.num_rows();
    let Some(array) = batch.column_by_name(name) else {
        return vec![0; n];
    };

    let data_type = array.data_type();
    if data_type.is_integer() || matches!(data_type, DataType::Boolean) {
        return match cast(array.as_ref(), &DataType::Int64) {
            Ok(ints) => ints
                .as_primitive::<Int64Type>()
                .iter()
                .map(|v| v.map_or(0, |v| v.max(0) as u64))
                .collect(),
            Err(err) => {
                warn!(column = name, %data_type, %err, "column is not numeric, using zeros");
                vec![0; n]
            }
        };
    }

    match cast(array.as_ref(), &DataType::Float64) {
        Ok(floats) => floats
            .as_primitive::<Float64Type>()
            .iter()
            .map(|v| match v {
                Some(f) if f.is_finite() && f > 0.0 => f.trunc() as u64,
                _ => 0,
            })
            .collect(),
        Err(err) => {
            warn!(column = name, %data_type, %err, "column is not numeric, using zeros");
            vec![0; n]
        }
    }
}

fn time_column(batch: &RecordBatch, name: &str) -> Vec<Option<NaiveDateTime>> {
    match batch.column_by_name(name) {
        Some(array) => timestamps(array.as_ref(), name),
        None => vec![None; batch.num_rows()],
    }
}

fn timestamps(array: &dyn Array, name: &str) -> Vec<Option<NaiveDateTime>> {
    let n = array.len();
    match array.data_type() {
        // Stored values are UTC epoch offsets whatever the declared zone.
        DataType::Timestamp(unit, _) => {
            let unit = *unit;
            match cast(array, &DataType::Int64) {
                Ok(raw) => raw
                    .as_primitive::<Int64Type>()
                    .iter()
                    .map(|v| v.and_then(|v| from_epoch(v, unit)))
                    .collect(),
                Err(err) => {
                    warn!(column = name, %err, "unreadable timestamp column");
                    vec![None; n]
                }
            }
        }
        DataType::Date32 | DataType::Date64 => {
            match cast(array, &DataType::Timestamp(TimeUnit::Millisecond, None)) {
                Ok(ts) => timestamps(ts.as_ref(), name),
                Err(err) => {
                    warn!(column = name, %err, "unreadable date column");
                    vec![None; n]
                }
            }
        }
        DataType::Utf8
        | DataType::LargeUtf8
        | DataType::Utf8View
        | DataType::Dictionary(_, _) => match cast(array, &DataType::Utf8) {
            Ok(strings) => strings
                .as_string::<i32>()
                .iter()
                .map(|v| v.and_then(parse_timestamp))
                .collect(),
            Err(err) => {
                warn!(column = name, %err, "unreadable timestamp column");
                vec![None; n]
            }
        },
        other => {
            warn!(column = name, data_type = %other, "unsupported timestamp type, using nulls");
            vec![None; n]
        }
    }
}

fn from_epoch(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let dt = match unit {
        TimeUnit::Second => DateTime::from_timestamp(value, 0),
        TimeUnit::Millisecond => DateTime::from_timestamp_millis(value),
        TimeUnit::Microsecond => DateTime::from_timestamp_micros(value),
        TimeUnit::Nanosecond => Some(DateTime::from_timestamp_nanos(value)),
    };
    dt.map(|dt| dt.naive_utc())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{
        Date32Array, Float64Array, Int32Array, Int64Array, ListBuilder, StringArray,
        StringBuilder, TimestampMicrosecondArray, TimestampNanosecondArray,
    };
    use arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    fn batch(columns: Vec<(&str, ArrayRef)>) -> RecordBatch {
        let fields: Vec<Field> = columns
            .iter()
            .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
            .collect();
        let arrays: Vec<ArrayRef> = columns.into_iter().map(|(_, a)| a).collect();
        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
    }

    fn strings(values: &[Option<&str>]) -> ArrayRef {
        Arc::new(StringArray::from(values.to_vec()))
    }

    fn string_lists(rows: &[Option<Vec<&str>>]) -> ArrayRef {
        let mut builder = ListBuilder::new(StringBuilder::new());
        for row in rows {
            match row {
                Some(items) => {
                    for item in items {
                        builder.values().append_value(item);
                    }
                    builder.append(true);
                }
                None => builder.append(false),
            }
        }
        Arc::new(builder.finish())
    }

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn missing_columns_degrade_to_defaults() {
        let b = batch(vec![("id", strings(&[Some("a"), Some("b")]))]);
        let records = normalize_batch(&b);
        assert_eq!(records.len(), 2);
        let r = &records[0];
        assert_eq!(r.id, "a");
        assert_eq!(r.title, "");
        assert!(r.authors.is_empty());
        assert_eq!(r.stars, 0);
        assert_eq!(r.effective_stars, 0);
        assert!(r.created.is_none());
        assert!(r.language.is_none());
    }

    #[test]
    fn counters_coerce_and_clamp() {
        let b = batch(vec![
            ("stars", Arc::new(Int64Array::from(vec![Some(12), None, Some(-4)])) as ArrayRef),
            ("forks", Arc::new(Float64Array::from(vec![Some(3.9), Some(f64::NAN), Some(-1.0)])) as ArrayRef),
            ("watchers", strings(&[Some("17"), Some("n/a"), Some("2.5")])),
            ("open_issues", Arc::new(Int32Array::from(vec![Some(1), Some(2), None])) as ArrayRef),
        ]);
        let records = normalize_batch(&b);
        assert_eq!(
            records.iter().map(|r| r.stars).collect::<Vec<_>>(),
            vec![12, 0, 0]
        );
        assert_eq!(
            records.iter().map(|r| r.forks).collect::<Vec<_>>(),
            vec![3, 0, 0]
        );
        assert_eq!(
            records.iter().map(|r| r.watchers).collect::<Vec<_>>(),
            vec![17, 0, 2]
        );
        assert_eq!(
            records.iter().map(|r| r.open_issues).collect::<Vec<_>>(),
            vec![1, 2, 0]
        );
    }

    #[test]
    fn unsupported_counter_type_is_zero() {
        let b = batch(vec![("stars", string_lists(&[Some(vec!["1"])]))]);
        assert_eq!(normalize_batch(&b)[0].stars, 0);
    }

    #[test]
    fn effective_stars_from_either_column() {
        let both = batch(vec![
            ("stars", Arc::new(Int64Array::from(vec![50, 0])) as ArrayRef),
            ("stars_total", Arc::new(Int64Array::from(vec![5, 8])) as ArrayRef),
        ]);
        let records = normalize_batch(&both);
        assert_eq!(records[0].effective_stars, 50);
        assert_eq!(records[1].effective_stars, 8);

        let only_total = batch(vec![(
            "stars_total",
            Arc::new(Int64Array::from(vec![21])) as ArrayRef,
        )]);
        assert_eq!(normalize_batch(&only_total)[0].effective_stars, 21);

        let only_stars = batch(vec![("stars", Arc::new(Int64Array::from(vec![4])) as ArrayRef)]);
        assert_eq!(normalize_batch(&only_stars)[0].effective_stars, 4);
    }

    #[test]
    fn timestamps_from_arrow_types_are_naive_utc() {
        let micros = TimestampMicrosecondArray::from(vec![Some(1_704_067_200_000_000), None])
            .with_timezone("UTC");
        let nanos = TimestampNanosecondArray::from(vec![Some(1_706_745_600_000_000_000), None])
            .with_timezone("America/New_York");
        let days = Date32Array::from(vec![Some(19_723), None]);
        let b = batch(vec![
            ("created", Arc::new(micros) as ArrayRef),
            ("repo_created_at", Arc::new(nanos) as ArrayRef),
            ("repo_updated_at", Arc::new(days) as ArrayRef),
        ]);
        let records = normalize_batch(&b);
        assert_eq!(records[0].created, Some(ts("2024-01-01T00:00:00")));
        assert_eq!(records[0].repo_created_at, Some(ts("2024-02-01T00:00:00")));
        assert_eq!(records[0].repo_updated_at, Some(ts("2024-01-01")));
        assert!(records[1].created.is_none());
        assert!(records[1].repo_created_at.is_none());
        assert!(records[1].repo_updated_at.is_none());
    }

    #[test]
    fn timestamps_from_strings_degrade_per_cell() {
        let b = batch(vec![(
            "created",
            strings(&[
                Some("2024-03-05T10:00:00+02:00"),
                Some("not a date"),
                Some("2024-03-05"),
                None,
            ]),
        )]);
        let records = normalize_batch(&b);
        assert_eq!(records[0].created, Some(ts("2024-03-05 08:00:00")));
        assert!(records[1].created.is_none());
        assert_eq!(records[2].created, Some(ts("2024-03-05T00:00:00")));
        assert!(records[3].created.is_none());
    }

    #[test]
    fn parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(parse_timestamp("2024-01-02T03:04:05Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02 03:04:05"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02T03:04:05.000"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02 04:04:05+01:00"), Some(expected));
        assert_eq!(parse_timestamp("  "), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn sequences_from_lists_and_scalars() {
        let b = batch(vec![
            (
                "authors",
                string_lists(&[Some(vec!["Ada", "Alan"]), None, Some(vec![])]),
            ),
            (
                "categories_full",
                strings(&[Some("Machine Learning, Vision"), Some(""), None]),
            ),
        ]);
        let records = normalize_batch(&b);
        assert_eq!(records[0].authors, vec!["Ada", "Alan"]);
        assert!(records[1].authors.is_empty());
        assert!(records[2].authors.is_empty());
        assert_eq!(records[0].categories, vec!["Machine Learning, Vision"]);
        assert!(records[1].categories.is_empty());
        assert!(records[2].categories.is_empty());
    }

    #[test]
    fn search_blob_covers_every_searchable_column() {
        let b = batch(vec![
            ("title", strings(&[Some("Sparse ATTENTION")])),
            ("abstract", strings(&[Some("Long Context")])),
            ("keywords", string_lists(&[Some(vec!["Transformers"])])),
            ("authors", string_lists(&[Some(vec!["Grace Hopper"])])),
            ("repo_description", strings(&[Some("Fast KERNELS")])),
            ("categories_full", strings(&[Some("cs.CL")])),
        ]);
        let record = &normalize_batch(&b)[0];
        for needle in [
            "sparse attention",
            "long context",
            "transformers",
            "grace hopper",
            "fast kernels",
            "cs.cl",
        ] {
            assert!(record.search_blob.contains(needle), "missing {needle}");
        }
    }

    #[test]
    fn blank_optional_text_is_none() {
        let b = batch(vec![
            ("language", strings(&[Some("  "), Some("Rust")])),
            ("github_link", strings(&[Some(""), Some("https://github.com/x/y")])),
        ]);
        let records = normalize_batch(&b);
        assert!(records[0].language.is_none());
        assert!(records[0].github_url.is_none());
        assert_eq!(records[1].language.as_deref(), Some("Rust"));
    }

    #[test]
    fn batches_keep_row_order() {
        let first = batch(vec![("id", strings(&[Some("a"), Some("b")]))]);
        let second = batch(vec![("id", strings(&[Some("c")]))]);
        let ids: Vec<String> = normalize_batches(&[first, second])
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
