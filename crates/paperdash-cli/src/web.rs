//! Read-only HTML dashboard served with axum.
//!
//! Every request goes through the shared [`SnapshotCache`]; filters and
//! pagination are recomputed from the query string on each render.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chrono::{NaiveDate, Utc};
use minijinja::Environment;
use paperdash_core::{
    ALL_LANGUAGES, DateRange, FilterSpec, Snapshot, SortKey, ingest_label, paginate, query,
};
use paperdash_store::{SnapshotCache, SnapshotSource};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::display::footer;
use crate::view::{CardView, Palette, Theme, group_thousands};

const DASHBOARD_TEMPLATE: &str = "dashboard.html";
const NOTICE_TEMPLATE: &str = "notice.html";

const NO_MATCHES: &str = "No papers match your filters. Try adjusting your search criteria.";

#[derive(Clone)]
pub struct AppState {
    source: Arc<dyn SnapshotSource>,
    cache: Arc<Mutex<SnapshotCache>>,
    templates: Arc<Environment<'static>>,
}

impl AppState {
    pub fn new(source: Arc<dyn SnapshotSource>, cache: SnapshotCache) -> anyhow::Result<Self> {
        Ok(Self {
            source,
            cache: Arc::new(Mutex::new(cache)),
            templates: Arc::new(build_template_env()?),
        })
    }
}

fn build_template_env() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template(
        DASHBOARD_TEMPLATE,
        include_str!("../templates/dashboard.html"),
    )?;
    env.add_template(NOTICE_TEMPLATE, include_str!("../templates/notice.html"))?;
    Ok(env)
}

/// Raw query string values. Anything unparseable falls back to its default.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DashboardParams {
    pub q: String,
    pub language: String,
    pub sort: String,
    pub from: String,
    pub to: String,
    pub page: String,
    pub theme: String,
    /// Non-empty to drop the cached snapshot before rendering.
    pub refresh: String,
}

/// Everything the dashboard template renders.
#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub theme: Theme,
    pub toggle_theme: Theme,
    pub palette: Palette,
    pub search: String,
    pub language: String,
    pub languages: Vec<String>,
    pub sort: &'static str,
    pub sort_options: Vec<&'static str>,
    pub from: String,
    pub to: String,
    pub min_date: String,
    pub max_date: String,
    pub ingest_label: String,
    pub total_papers: String,
    /// Papers that passed the filters, across all pages.
    pub result_count: String,
    pub cards: Vec<CardView>,
    pub page: usize,
    pub total_pages: usize,
    pub has_previous: bool,
    pub has_next: bool,
    pub footer: String,
    pub empty_message: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct NoticeView<'a> {
    palette: Palette,
    title: &'a str,
    message: String,
}

/// Resolve `params` against `snapshot` and produce the page to render.
///
/// Without explicit `from`/`to`, the date filter defaults to the last
/// sixty days ending `today`, clipped to the earliest publication date.
pub fn build_view(snapshot: &Snapshot, params: &DashboardParams, today: NaiveDate) -> DashboardView {
    let theme = Theme::from_param(Some(params.theme.as_str()));
    let bounds = snapshot.created_bounds();

    let date_range = match DateRange::from_bounds(parse_date(&params.from), parse_date(&params.to)) {
        Some(range) => Some(range),
        None => bounds.map(|(earliest, _)| DateRange::default_window(earliest, today)),
    };

    // Blank means "All"; otherwise the value is compared as given.
    let language = if params.language.trim().is_empty() {
        ALL_LANGUAGES.to_string()
    } else {
        params.language.clone()
    };
    let spec = FilterSpec {
        search_text: params.q.clone(),
        language: language.clone(),
        sort: SortKey::from_label(&params.sort),
        date_range,
    };

    let matched = query(&snapshot.records, &spec);
    let requested = params.page.trim().parse::<usize>().unwrap_or(1);
    let page = paginate(&matched, requested);

    let mut languages = vec![ALL_LANGUAGES.to_string()];
    languages.extend(snapshot.languages());

    DashboardView {
        theme,
        toggle_theme: theme.toggled(),
        palette: theme.palette(),
        search: params.q.clone(),
        language,
        languages,
        sort: spec.sort.label(),
        sort_options: SortKey::ALL.iter().map(|k| k.label()).collect(),
        from: date_range.map(|r| date_field(r.start)).unwrap_or_default(),
        to: date_range.map(|r| date_field(r.end)).unwrap_or_default(),
        min_date: bounds.map(|(lo, _)| lo.to_string()).unwrap_or_default(),
        max_date: today.to_string(),
        ingest_label: ingest_label(Some(snapshot.name.as_str())),
        total_papers: group_thousands(snapshot.len() as u64),
        result_count: group_thousands(matched.len() as u64),
        cards: page.items.iter().map(|r| CardView::from_record(r)).collect(),
        page: page.number,
        total_pages: page.total_pages,
        has_previous: page.has_previous(),
        has_next: page.has_next(),
        footer: footer(&page),
        empty_message: matched.is_empty().then_some(NO_MATCHES),
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "dashboard listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

async fn health_check() -> &'static str {
    "ok"
}

async fn dashboard(State(state): State<AppState>, Query(params): Query<DashboardParams>) -> Response {
    let loaded = {
        let mut cache = state.cache.lock().await;
        if !params.refresh.is_empty() {
            info!(location = %state.source.location(), "snapshot refresh requested");
            cache.invalidate();
        }
        cache.get(state.source.as_ref()).await
    };
    let palette = Theme::from_param(Some(params.theme.as_str())).palette();

    match loaded {
        Ok(Some(snapshot)) => {
            let view = build_view(&snapshot, &params, Utc::now().date_naive());
            match render(&state.templates, DASHBOARD_TEMPLATE, &view) {
                Ok(html) => html.into_response(),
                Err(err) => {
                    error!(%err, "failed to render dashboard");
                    internal_error(&state.templates, palette, format!("Failed to render dashboard: {err}"))
                }
            }
        }
        Ok(None) => {
            let notice = NoticeView {
                palette,
                title: "No data",
                message: format!("No data found in {}", state.source.location()),
            };
            notice_response(&state.templates, StatusCode::SERVICE_UNAVAILABLE, &notice)
        }
        Err(err) => {
            error!(location = %state.source.location(), %err, "failed to load snapshot");
            internal_error(&state.templates, palette, format!("Failed to load snapshot: {err}"))
        }
    }
}

fn internal_error(templates: &Environment<'static>, palette: Palette, message: String) -> Response {
    let notice = NoticeView {
        palette,
        title: "Error",
        message,
    };
    notice_response(templates, StatusCode::INTERNAL_SERVER_ERROR, &notice)
}

fn notice_response(templates: &Environment<'static>, status: StatusCode, notice: &NoticeView<'_>) -> Response {
    match render(templates, NOTICE_TEMPLATE, notice) {
        Ok(html) => (status, html).into_response(),
        Err(_) => (status, notice.message.clone()).into_response(),
    }
}

fn render(
    templates: &Environment<'static>,
    name: &str,
    ctx: &impl Serialize,
) -> Result<Html<String>, minijinja::Error> {
    let template = templates.get_template(name)?;
    Ok(Html(template.render(ctx)?))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Open bounds render as an empty date input.
fn date_field(date: NaiveDate) -> String {
    if date == NaiveDate::MIN || date == NaiveDate::MAX {
        String::new()
    } else {
        date.to_string()
    }
}
