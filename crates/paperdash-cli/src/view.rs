//! Display-ready view models shared by the terminal and HTML renderers.

use paperdash_core::Record;
use serde::Serialize;

const ABSTRACT_PREVIEW_CHARS: usize = 280;
const MAX_AUTHORS: usize = 5;
const MAX_KEYWORDS: usize = 8;
const MAX_CATEGORY_BADGES: usize = 2;

/// One record, formatted for a card.
#[derive(Debug, Clone, Serialize)]
pub struct CardView {
    pub id: String,
    pub title: String,
    pub abstract_preview: String,
    pub language: Option<String>,
    pub categories: Vec<String>,
    pub license: Option<String>,
    pub stars: String,
    pub stars_7d: String,
    pub stars_30d: String,
    pub forks: String,
    pub watchers: String,
    pub created: String,
    pub repo_created: String,
    pub repo_updated: String,
    pub authors: String,
    pub keywords: Vec<String>,
    pub paper_url: Option<String>,
    pub github_url: Option<String>,
}

impl CardView {
    pub fn from_record(record: &Record) -> Self {
        let title = if record.title.trim().is_empty() {
            "Untitled".to_string()
        } else {
            record.title.clone()
        };
        let categories = record
            .categories
            .iter()
            .flat_map(|c| c.split(','))
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .take(MAX_CATEGORY_BADGES)
            .map(str::to_string)
            .collect();

        Self {
            id: record.id.clone(),
            title,
            abstract_preview: preview(&record.abstract_text, ABSTRACT_PREVIEW_CHARS),
            language: record.language.clone(),
            categories,
            license: record.license.clone(),
            stars: group_thousands(record.effective_stars),
            stars_7d: group_thousands(record.stars_last_7d),
            stars_30d: group_thousands(record.stars_last_30d),
            forks: group_thousands(record.forks),
            watchers: group_thousands(record.watchers),
            created: format_ts(record.created, "%Y-%m-%d"),
            repo_created: format_ts(record.repo_created_at, "%Y-%m-%d"),
            repo_updated: format_ts(record.repo_updated_at, "%Y-%m-%d %H:%M UTC"),
            authors: record
                .authors
                .iter()
                .take(MAX_AUTHORS)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            keywords: record.keywords.iter().take(MAX_KEYWORDS).cloned().collect(),
            paper_url: record.paper_url.clone(),
            github_url: record.github_url.clone(),
        }
    }
}

/// Light or dark palette; carried in the `theme` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Light => Palette {
                background: "#f8fafc",
                card: "#ffffff",
                border: "rgba(203, 213, 225, 0.6)",
                title: "#0f172a",
                text: "#334155",
                muted: "#64748b",
                accent: "#1d4ed8",
                badge: "rgba(139, 92, 246, 0.15)",
                badge_text: "#6d28d9",
                keyword: "rgba(245, 158, 11, 0.15)",
                keyword_text: "#b45309",
            },
            Theme::Dark => Palette {
                background: "#0d1117",
                card: "#0f172a",
                border: "rgba(56, 189, 248, 0.12)",
                title: "#f1f5f9",
                text: "#cbd5e1",
                muted: "#94a3b8",
                accent: "#7dd3fc",
                badge: "rgba(139, 92, 246, 0.15)",
                badge_text: "#c4b5fd",
                keyword: "rgba(251, 191, 36, 0.1)",
                keyword_text: "#fcd34d",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Palette {
    pub background: &'static str,
    pub card: &'static str,
    pub border: &'static str,
    pub title: &'static str,
    pub text: &'static str,
    pub muted: &'static str,
    pub accent: &'static str,
    pub badge: &'static str,
    pub badge_text: &'static str,
    pub keyword: &'static str,
    pub keyword_text: &'static str,
}

/// `1234567` → `"1,234,567"`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// First `max` characters, with `...` appended when anything was cut.
fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn format_ts(ts: Option<chrono::NaiveDateTime>, fmt: &str) -> String {
    ts.map(|t| t.format(fmt).to_string()).unwrap_or_default()
}
