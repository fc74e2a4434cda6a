//! Error types for the mapping module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that make the input mapping unusable as a whole.
#[derive(Debug, Error)]
pub enum MappingError {
    /// Mapping file does not exist.
    #[error("Input file not found: {path}")]
    NotFound { path: PathBuf },

    /// Mapping file exists but could not be read.
    #[error("Failed to read input file {path}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Mapping file is not valid JSON.
    #[error("Failed to parse JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Top-level JSON value is not an object.
    #[error("Mapping must be a JSON object mapping source paths to metadata")]
    NotAnObject,
}
