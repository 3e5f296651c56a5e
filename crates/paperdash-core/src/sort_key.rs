//! Named sort orders offered by the dashboard.
//!
//! Each key maps to one record field and a direction. Unknown names fall
//! back to [`SortKey::StarsTotal`].

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDateTime;

use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    #[default]
    StarsTotal,
    Stars7d,
    Stars30d,
    NewestFirst,
    OldestFirst,
    Forks,
    Watchers,
    RepoUpdatedRecent,
    RepoUpdatedOldest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// The value a record contributes to a sort. Counters are never null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortValue {
    Count(u64),
    Time(Option<NaiveDateTime>),
}

impl SortKey {
    /// Every key, in the order the UI lists them.
    pub const ALL: [SortKey; 9] = [
        SortKey::StarsTotal,
        SortKey::Stars7d,
        SortKey::Stars30d,
        SortKey::NewestFirst,
        SortKey::OldestFirst,
        SortKey::Forks,
        SortKey::Watchers,
        SortKey::RepoUpdatedRecent,
        SortKey::RepoUpdatedOldest,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortKey::StarsTotal => "Stars (Total)",
            SortKey::Stars7d => "Stars (7 days)",
            SortKey::Stars30d => "Stars (30 days)",
            SortKey::NewestFirst => "Newest First",
            SortKey::OldestFirst => "Oldest First",
            SortKey::Forks => "Forks",
            SortKey::Watchers => "Watchers",
            SortKey::RepoUpdatedRecent => "Repo Updated (Recent)",
            SortKey::RepoUpdatedOldest => "Repo Updated (Oldest)",
        }
    }

    /// Look up a key by its exact display label, falling back to the default.
    pub fn from_label(label: &str) -> SortKey {
        Self::ALL
            .into_iter()
            .find(|key| key.label() == label)
            .unwrap_or_default()
    }

    /// Name of the record field this key orders by.
    pub fn field(self) -> &'static str {
        match self {
            SortKey::StarsTotal => "effective_stars",
            SortKey::Stars7d => "stars_last_7d",
            SortKey::Stars30d => "stars_last_30d",
            SortKey::NewestFirst | SortKey::OldestFirst => "created",
            SortKey::Forks => "forks",
            SortKey::Watchers => "watchers",
            SortKey::RepoUpdatedRecent | SortKey::RepoUpdatedOldest => "repo_updated_at",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            SortKey::OldestFirst | SortKey::RepoUpdatedOldest => Direction::Ascending,
            _ => Direction::Descending,
        }
    }

    pub fn value(self, record: &Record) -> SortValue {
        match self {
            SortKey::StarsTotal => SortValue::Count(record.effective_stars),
            SortKey::Stars7d => SortValue::Count(record.stars_last_7d),
            SortKey::Stars30d => SortValue::Count(record.stars_last_30d),
            SortKey::NewestFirst | SortKey::OldestFirst => SortValue::Time(record.created),
            SortKey::Forks => SortValue::Count(record.forks),
            SortKey::Watchers => SortValue::Count(record.watchers),
            SortKey::RepoUpdatedRecent | SortKey::RepoUpdatedOldest => {
                SortValue::Time(record.repo_updated_at)
            }
        }
    }

    /// Total order for this key: direction applied to present values,
    /// nulls after everything else in both directions. Equal values compare
    /// `Equal` so a stable sort keeps snapshot order among ties.
    pub fn compare(self, a: &Record, b: &Record) -> Ordering {
        let ordering = match (self.value(a), self.value(b)) {
            (SortValue::Count(x), SortValue::Count(y)) => x.cmp(&y),
            (SortValue::Time(x), SortValue::Time(y)) => match (x, y) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (None, None) => return Ordering::Equal,
            },
            // A key always yields the same variant for every record.
            _ => Ordering::Equal,
        };
        match self.direction() {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
