//! Filtering and ordering over a loaded snapshot.
//!
//! [`query`] is a pure function of its inputs: the same records and the same
//! [`FilterSpec`] always produce the same sequence.

use chrono::{Days, NaiveDate};
use tracing::debug;

use crate::record::Record;
use crate::sort_key::SortKey;

/// Language selector value that disables the language filter.
pub const ALL_LANGUAGES: &str = "All";

/// Days covered by the dashboard's default date window.
pub const DEFAULT_WINDOW_DAYS: u64 = 60;

/// Inclusive range of publication dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Range from optional bounds; an open side extends to the calendar limit.
    /// `None` when both sides are open.
    pub fn from_bounds(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<Self> {
        if start.is_none() && end.is_none() {
            return None;
        }
        Some(Self::new(
            start.unwrap_or(NaiveDate::MIN),
            end.unwrap_or(NaiveDate::MAX),
        ))
    }

    /// `[max(earliest, today - 60 days), today]`.
    pub fn default_window(earliest: NaiveDate, today: NaiveDate) -> Self {
        let window_start = today
            .checked_sub_days(Days::new(DEFAULT_WINDOW_DAYS))
            .unwrap_or(earliest);
        Self::new(earliest.max(window_start), today)
    }
}

/// What the user asked to see. Built fresh for every render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub search_text: String,
    pub language: String,
    pub sort: SortKey,
    pub date_range: Option<DateRange>,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            language: ALL_LANGUAGES.to_string(),
            sort: SortKey::default(),
            date_range: None,
        }
    }
}

impl FilterSpec {
    /// Lowercased whitespace-separated search words.
    pub fn search_words(&self) -> Vec<String> {
        self.search_text
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// Whether `record` passes the language, text and date filters, given
    /// the precomputed [`search_words`](Self::search_words).
    fn matches_words(&self, record: &Record, words: &[String]) -> bool {
        if self.language != ALL_LANGUAGES && record.language.as_deref() != Some(self.language.as_str()) {
            return false;
        }
        if !words.iter().all(|w| record.search_blob.contains(w.as_str())) {
            return false;
        }
        // Undated records only drop out while a range is active.
        if let Some(range) = self.date_range {
            match record.created_date() {
                Some(date) if range.contains(date) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Filter `records` by `spec` and order the survivors by `spec.sort`.
///
/// Sorting is stable, so ties keep their snapshot order.
pub fn query<'a>(records: &'a [Record], spec: &FilterSpec) -> Vec<&'a Record> {
    let words = spec.search_words();
    let mut matched: Vec<&Record> = records
        .iter()
        .filter(|r| spec.matches_words(r, &words))
        .collect();
    matched.sort_by(|a, b| spec.sort.compare(a, b));
    debug!(
        sort = %spec.sort,
        field = spec.sort.field(),
        matched = matched.len(),
        total = records.len(),
        "query"
    );
    matched
}
