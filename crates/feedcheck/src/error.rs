//! Error types for the feedcheck library.
//!
//! These errors only surface at the outer boundary (reading files, loading
//! configuration). Problems found in the feed itself are notices.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for feedcheck operations.
#[derive(Debug, Error)]
pub enum FeedCheckError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error in '{filename}': {source}")]
    Csv {
        filename: String,
        #[source]
        source: csv::Error,
    },

    /// Empty feed or no tables to validate.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The rule worker pool could not be created.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for feedcheck operations.
pub type Result<T> = std::result::Result<T, FeedCheckError>;
