//! Snapshot loading: sources, Parquet decoding, normalisation, and caching.

mod error;
pub use error::StoreError;

pub mod cache;
pub mod decode;
pub mod loader;
pub mod source;

#[cfg(feature = "gcs")]
pub mod gcs;

pub use cache::{DEFAULT_TTL, SnapshotCache};
pub use decode::read_parquet_bytes;
pub use loader::load_latest;
pub use source::{LocalDirSource, SnapshotObject, SnapshotSource};

#[cfg(feature = "gcs")]
pub use gcs::GcsSource;
