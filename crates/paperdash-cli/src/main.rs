mod display;
mod view;
mod web;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use paperdash_core::{ALL_LANGUAGES, DateRange, FilterSpec, SortKey, paginate, query};
use paperdash_store::{GcsSource, LocalDirSource, SnapshotCache, SnapshotSource};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "paperdash")]
#[command(about = "Browse trending papers and their code repositories")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    /// Seconds a loaded snapshot is served before the source is checked again
    #[arg(long, global = true, env = "PAPERDASH_CACHE_TTL", default_value = "3600")]
    cache_ttl: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Read snapshots from a local directory instead of Cloud Storage
    #[arg(long, global = true, env = "PAPERDASH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Cloud Storage bucket holding the snapshots
    #[arg(long, global = true, env = "PAPERDASH_BUCKET", default_value = "paperswithcode")]
    bucket: String,

    /// Object prefix inside the bucket
    #[arg(long, global = true, env = "PAPERDASH_PREFIX", default_value = "")]
    prefix: String,

    /// OAuth bearer token for private buckets
    #[arg(long, global = true, env = "PAPERDASH_GCS_TOKEN", hide_env_values = true)]
    gcs_token: Option<String>,

    /// Cloud Storage JSON API base URL, for emulators and proxies
    #[arg(long, global = true, env = "PAPERDASH_GCS_ENDPOINT")]
    gcs_endpoint: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the latest snapshot's name, capture time, size and languages
    Info,

    /// Print one page of filtered, sorted papers
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Page number (1-based, clamped to the last page)
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Emit the page as JSON records instead of cards
        #[arg(long)]
        json: bool,
    },

    /// Serve the HTML dashboard
    Serve {
        /// Address to listen on
        #[arg(long, env = "PAPERDASH_ADDR", default_value = "127.0.0.1:8080")]
        addr: String,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Words that must all appear in a paper's text fields
    #[arg(short, long, default_value = "")]
    search: String,

    /// Exact repository language, or "All"
    #[arg(short, long, default_value = ALL_LANGUAGES)]
    language: String,

    /// Sort order, matched exactly; anything else sorts by "Stars (Total)".
    ///
    /// One of: "Stars (Total)", "Stars (7 days)", "Stars (30 days)",
    /// "Newest First", "Oldest First", "Forks", "Watchers",
    /// "Repo Updated (Recent)", "Repo Updated (Oldest)".
    #[arg(long, default_value = "Stars (Total)")]
    sort: String,

    /// Earliest publication date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Latest publication date (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl FilterArgs {
    fn to_spec(&self) -> FilterSpec {
        FilterSpec {
            search_text: self.search.clone(),
            language: self.language.clone(),
            sort: SortKey::from_label(&self.sort),
            date_range: DateRange::from_bounds(self.from, self.to),
        }
    }
}

impl SourceArgs {
    fn build(&self) -> Arc<dyn SnapshotSource> {
        match &self.data_dir {
            Some(dir) => Arc::new(LocalDirSource::new(dir)),
            None => {
                let mut source = GcsSource::new(self.bucket.clone(), self.prefix.clone())
                    .with_token(self.gcs_token.clone());
                if let Some(endpoint) = &self.gcs_endpoint {
                    source = source.with_api_base(endpoint.clone());
                }
                Arc::new(source)
            }
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    info!("paperdash v{}", env!("CARGO_PKG_VERSION"));

    let source = cli.source.build();
    let mut cache = SnapshotCache::new(Duration::from_secs(cli.cache_ttl));

    match cli.command {
        Commands::Info => {
            let location = source.location();
            let snapshot = cache
                .get(source.as_ref())
                .await
                .with_context(|| format!("failed to load snapshot from {location}"))?;
            match snapshot {
                Some(snapshot) => display::print_snapshot_info(&location, &snapshot),
                None => println!("No data found in {location}"),
            }
        }

        Commands::List {
            filters,
            page,
            json,
        } => {
            let location = source.location();
            let Some(snapshot) = cache
                .get(source.as_ref())
                .await
                .with_context(|| format!("failed to load snapshot from {location}"))?
            else {
                println!("No data found in {location}");
                return Ok(());
            };

            let spec = filters.to_spec();
            let matched = query(&snapshot.records, &spec);
            let page = paginate(&matched, page);

            if json {
                println!("{}", serde_json::to_string_pretty(page.items)?);
            } else if matched.is_empty() {
                println!("No papers match your filters. Try adjusting your search criteria.");
            } else {
                display::print_page(&page);
            }
        }

        Commands::Serve { addr } => {
            let state = web::AppState::new(source, cache)?;
            web::serve(&addr, state).await?;
        }
    }

    Ok(())
}
