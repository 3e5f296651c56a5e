//! Terminal rendering for paper cards and snapshot summaries.
//!
//! Each card is printed as a header line followed by labelled sections;
//! empty fields and empty sections are skipped.

use paperdash_core::{Page, Record, Snapshot, ingest_label};

use crate::view::{CardView, group_thousands};

const LABEL_WIDTH: usize = 14;

// ── Public API ──

/// Print one page of results as vertical cards plus a footer.
pub fn print_page(page: &Page<'_, &Record>) {
    for record in page.items {
        print_paper_card(&CardView::from_record(record));
    }
    println!("{}", footer(page));
}

/// Print a single paper as a vertical card.
pub fn print_paper_card(card: &CardView) {
    println!("=== {} ===", card.title);
    let badges = badges(card);
    if !badges.is_empty() {
        println!("[{}]", badges.join("] ["));
    }
    if !card.abstract_preview.is_empty() {
        println!("{}", card.abstract_preview);
    }
    println!();

    print_section(
        "Repository",
        &[
            ("stars", Some(card.stars.as_str())),
            ("stars 7d", Some(card.stars_7d.as_str())),
            ("stars 30d", Some(card.stars_30d.as_str())),
            ("forks", Some(card.forks.as_str())),
            ("watchers", Some(card.watchers.as_str())),
        ],
    );
    print_section(
        "Dates",
        &[
            ("published", non_empty(&card.created)),
            ("repo created", non_empty(&card.repo_created)),
            ("repo updated", non_empty(&card.repo_updated)),
        ],
    );
    let keywords = card.keywords.join(", ");
    print_section(
        "Paper",
        &[
            ("id", non_empty(&card.id)),
            ("authors", non_empty(&card.authors)),
            ("keywords", non_empty(&keywords)),
        ],
    );
    print_section(
        "Links",
        &[
            ("paper", card.paper_url.as_deref()),
            ("github", card.github_url.as_deref()),
        ],
    );
}

/// Print the `info` summary for a loaded snapshot.
pub fn print_snapshot_info(location: &str, snapshot: &Snapshot) {
    println!("=== {} ===", snapshot.name);
    println!();

    let papers = group_thousands(snapshot.len() as u64);
    let label = ingest_label(Some(snapshot.name.as_str()));
    let (earliest, latest) = match snapshot.created_bounds() {
        Some((lo, hi)) => (lo.to_string(), hi.to_string()),
        None => (String::new(), String::new()),
    };
    print_section(
        "Snapshot",
        &[
            ("location", Some(location)),
            ("ingested", Some(label.as_str())),
            ("papers", Some(papers.as_str())),
        ],
    );
    print_section(
        "Publication Dates",
        &[
            ("earliest", non_empty(&earliest)),
            ("latest", non_empty(&latest)),
        ],
    );

    let languages = snapshot.languages();
    if !languages.is_empty() {
        println!("Languages ({})", languages.len());
        for language in &languages {
            println!("  {language}");
        }
        println!();
    }
}

/// `Page 2 of 5 · Showing 49-96 of 230 papers`.
pub fn footer<T>(page: &Page<'_, T>) -> String {
    let first = if page.total_items == 0 { 0 } else { page.start + 1 };
    format!(
        "Page {} of {} · Showing {}-{} of {} papers",
        page.number,
        page.total_pages,
        group_thousands(first as u64),
        group_thousands(page.end() as u64),
        group_thousands(page.total_items as u64),
    )
}

// ── Section rendering ──

fn print_section(header: &str, rows: &[(&str, Option<&str>)]) {
    if rows.iter().all(|(_, value)| value.is_none()) {
        return;
    }
    println!("{header}");
    for (label, value) in rows {
        if let Some(value) = value {
            println!("  {:<width$} {}", label, value, width = LABEL_WIDTH);
        }
    }
    println!();
}

// ── Helpers ──

fn badges(card: &CardView) -> Vec<&str> {
    card.language
        .as_deref()
        .into_iter()
        .chain(card.categories.iter().map(String::as_str))
        .chain(card.license.as_deref())
        .collect()
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}
