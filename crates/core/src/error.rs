//! Error types for leaklab-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while reading process memory counters.
#[derive(Debug, Error)]
pub enum Error {
    /// The status file could not be opened or read.
    #[error("failed to read {path}: {source}")]
    StatusRead {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A required counter field was absent from the status file.
    #[error("field {field} not found in process status")]
    MissingField {
        /// The procfs field name.
        field: &'static str,
    },

    /// A counter line did not match the expected `Name: value kB` shape.
    #[error("malformed status line: {line}")]
    MalformedLine {
        /// The offending line.
        line: String,
    },
}
