//! Paper + repository snapshot model and the query engine over it.

pub mod ingest;
pub mod normalize;
pub mod paginate;
pub mod query;
pub mod record;
pub mod schema;
pub mod sort_key;

pub use ingest::{SNAPSHOT_EXTENSION, ingest_label, parse_ingest_time};
pub use normalize::{normalize_batch, normalize_batches};
pub use paginate::{PAGE_SIZE, Page, paginate};
pub use query::{ALL_LANGUAGES, DateRange, FilterSpec, query};
pub use record::{Record, Snapshot};
pub use schema::snapshot;
pub use sort_key::SortKey;
