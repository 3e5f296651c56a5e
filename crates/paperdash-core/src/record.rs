//! Paper + repository records and the immutable snapshot that holds them.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One research paper merged with its linked code repository.
///
/// Counters are never negative and default to 0 when the snapshot has no
/// usable value. Timestamps are naive UTC.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub authors: Vec<String>,
    pub keywords: Vec<String>,

    pub language: Option<String>,
    pub categories: Vec<String>,
    pub repo_description: Option<String>,

    pub stars: u64,
    pub stars_total: u64,
    pub stars_last_7d: u64,
    pub stars_last_30d: u64,
    pub forks: u64,
    pub watchers: u64,
    pub open_issues: u64,

    pub created: Option<NaiveDateTime>,
    pub repo_created_at: Option<NaiveDateTime>,
    pub repo_updated_at: Option<NaiveDateTime>,

    pub paper_url: Option<String>,
    pub github_url: Option<String>,
    pub license: Option<String>,

    /// `stars` when positive, otherwise `stars_total`.
    pub effective_stars: u64,
    /// Lowercased searchable text. Rebuilt by [`Record::refresh_derived`].
    #[serde(skip)]
    pub search_blob: String,
}

impl Record {
    /// Recompute `effective_stars` and `search_blob` from the source fields.
    ///
    /// Must be called after any source field changes.
    pub fn refresh_derived(&mut self) {
        self.effective_stars = effective_stars(self.stars, self.stars_total);
        self.search_blob = self.build_search_blob();
    }

    /// Builder-style variant of [`refresh_derived`](Self::refresh_derived).
    pub fn with_derived(mut self) -> Self {
        self.refresh_derived();
        self
    }

    /// Calendar date of publication, if known.
    pub fn created_date(&self) -> Option<NaiveDate> {
        self.created.map(|ts| ts.date())
    }

    fn build_search_blob(&self) -> String {
        let parts = [
            self.title.to_lowercase(),
            self.abstract_text.to_lowercase(),
            self.keywords.join(" ").to_lowercase(),
            self.authors.join(" ").to_lowercase(),
            self.repo_description
                .as_deref()
                .unwrap_or_default()
                .to_lowercase(),
            self.categories.join(" ").to_lowercase(),
        ];
        parts.join(" ")
    }
}

/// Popularity metric used for the default sort.
pub fn effective_stars(stars: u64, stars_total: u64) -> u64 {
    if stars > 0 { stars } else { stars_total }
}

/// An immutable, fully normalised capture of the dataset.
///
/// Replaced wholesale on refresh; never mutated in place.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Object name (basename) the snapshot was read from.
    pub name: String,
    /// Capture time parsed from `name`, if it follows the `YYYYMMDDHH` convention.
    pub ingested_at: Option<NaiveDateTime>,
    pub records: Vec<Record>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct languages present in the snapshot.
    pub fn languages(&self) -> Vec<String> {
        self.records
            .iter()
            .filter_map(|r| r.language.as_deref())
            .filter(|l| !l.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Earliest and latest publication date, ignoring records without one.
    pub fn created_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.records.iter().filter_map(Record::created_date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }
}
