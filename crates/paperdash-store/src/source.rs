//! Where snapshot files come from.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use paperdash_core::SNAPSHOT_EXTENSION;
use tracing::warn;

use crate::StoreError;

/// One snapshot file at a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotObject {
    /// Source-relative key, e.g. `2024061507.parquet` or `exports/2024061507.parquet`.
    pub key: String,
    /// Last modification time reported by the source.
    pub updated: DateTime<Utc>,
}

impl SnapshotObject {
    pub fn basename(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

/// A location holding snapshot files.
///
/// Implementations only report `.parquet` objects directly at the location.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Human-readable location, used in messages.
    fn location(&self) -> String;

    /// All snapshot objects currently at the location.
    async fn list(&self) -> Result<Vec<SnapshotObject>, StoreError>;

    /// Raw bytes of one object returned by [`list`](Self::list).
    async fn fetch(&self, object: &SnapshotObject) -> Result<Bytes, StoreError>;
}

pub fn is_snapshot_name(name: &str) -> bool {
    name.ends_with(SNAPSHOT_EXTENSION)
}

/// Most recently updated object. Equal timestamps resolve to the greatest key.
pub fn latest(objects: &[SnapshotObject]) -> Option<&SnapshotObject> {
    objects
        .iter()
        .max_by(|a, b| a.updated.cmp(&b.updated).then_with(|| a.key.cmp(&b.key)))
}

// ── Local directory ──

/// Snapshot files in a directory on disk. `updated` is the file mtime.
#[derive(Debug, Clone)]
pub struct LocalDirSource {
    dir: PathBuf,
}

impl LocalDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SnapshotSource for LocalDirSource {
    fn location(&self) -> String {
        self.dir.display().to_string()
    }

    async fn list(&self) -> Result<Vec<SnapshotObject>, StoreError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut objects = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !is_snapshot_name(&name) {
                continue;
            }
            let modified = match entry.metadata().await {
                Ok(meta) if meta.is_file() => meta.modified(),
                Ok(_) => continue,
                Err(err) => Err(err),
            };
            match modified {
                Ok(mtime) => objects.push(SnapshotObject {
                    key: name,
                    updated: DateTime::<Utc>::from(mtime),
                }),
                Err(err) => warn!(file = %name, %err, "skipping snapshot with unreadable metadata"),
            }
        }
        Ok(objects)
    }

    async fn fetch(&self, object: &SnapshotObject) -> Result<Bytes, StoreError> {
        let path = self.dir.join(&object.key);
        if !path.exists() {
            return Err(StoreError::SnapshotNotFound(path.display().to_string()));
        }
        let data = tokio::fs::read(&path).await?;
        Ok(Bytes::from(data))
    }
}
