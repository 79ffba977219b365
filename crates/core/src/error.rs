//! Error types for the agrisense pipeline.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the agrisense pipeline.
///
/// Row-level problems never surface as `Err` from a pipeline stage; they are
/// counted and the row is dropped. These variants cover the places where a
/// caller does need a hard failure (bad config, unreadable files) plus the
/// field parsers whose errors the ingestor folds into counts.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A date or numeric field could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A stage was handed zero usable rows.
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV read/write error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Create an empty dataset error.
    pub fn empty_dataset(msg: impl Into<String>) -> Self {
        Error::EmptyDataset(msg.into())
    }
}
