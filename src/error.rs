// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the extraction pipeline.
///
/// Per-cell parse failures are not errors: the cleaner stores them as nulls.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing credentials or identifiers. Raised before any network call.
    #[error("configuration error: {0}")]
    Config(String),

    /// The table API answered with a non-success status.
    #[error("upstream returned {status} for {url}: {body}")]
    Upstream {
        status: u16,
        url: String,
        body: String,
    },

    /// The table API could not be reached or its body could not be decoded.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid filter expression `{0}`")]
    InvalidFilter(String),

    #[error("export failed: {0}")]
    Export(String),

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("excel error: {0}")]
    Excel(#[from] rust_xlsxwriter::XlsxError),

    #[error("invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures that came from the remote table API.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
