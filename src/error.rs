use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP status {status} fetching {url}")]
    Status { url: String, status: u16 },

    #[error("Truncated download: expected {expected} bytes, wrote {written}")]
    TruncatedDownload { expected: u64, written: u64 },

    #[error("Archive member escapes the extraction directory: {}", .0.display())]
    UnsafeArchivePath(PathBuf),

    #[error("{file}: row {row} has {found} fields, column index {column} required")]
    MissingColumn {
        file: String,
        row: usize,
        column: usize,
        found: usize,
    },

    #[error("Row count mismatch across combine inputs: {}", format_counts(.counts))]
    RowCountMismatch { counts: Vec<(String, usize)> },

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

fn format_counts(counts: &[(String, usize)]) -> String {
    counts
        .iter()
        .map(|(file, rows)| format!("{file}={rows}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, EtlError>;
