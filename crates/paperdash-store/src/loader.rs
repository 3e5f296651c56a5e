//! Latest-snapshot selection and loading.

use paperdash_core::{Snapshot, normalize_batches, parse_ingest_time};
use tracing::info;

use crate::decode::read_parquet_bytes;
use crate::source::{SnapshotSource, latest};
use crate::StoreError;

/// Load the most recently updated snapshot at `source`.
///
/// Returns `Ok(None)` when the location holds no snapshot files. Storage
/// and decoding failures are errors; per-field problems are not.
pub async fn load_latest(source: &dyn SnapshotSource) -> Result<Option<Snapshot>, StoreError> {
    let objects = source.list().await?;
    let Some(object) = latest(&objects) else {
        info!(location = %source.location(), "no snapshots found");
        return Ok(None);
    };

    let data = source.fetch(object).await?;
    let bytes = data.len();
    let batches = read_parquet_bytes(data)?;
    let records = normalize_batches(&batches);

    let name = object.basename().to_string();
    info!(snapshot = %name, bytes, rows = records.len(), "loaded snapshot");
    Ok(Some(Snapshot {
        ingested_at: parse_ingest_time(&name),
        name,
        records,
    }))
}
