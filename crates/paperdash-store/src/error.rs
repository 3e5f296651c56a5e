use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot not found: {0}")]
    SnapshotNotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[cfg(feature = "gcs")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[cfg(feature = "gcs")]
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[cfg(feature = "gcs")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
