//! Error types for snapshot capture and storage.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from the snapshot side of the engine.
///
/// Generator operations are total and report through [`crate::LeakReport`];
/// everything that can actually fail lives here.
#[derive(Debug, Error)]
pub enum Error {
    /// Writing an artifact to disk failed.
    #[error("failed to write snapshot to {path}: {source}")]
    Write {
        /// Target artifact path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The snapshot directory could not be created.
    #[error("failed to create snapshot directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The snapshot document could not be encoded.
    #[error("failed to encode snapshot document: {0}")]
    Encode(#[from] serde_json::Error),

    /// Reading process memory counters failed.
    #[error(transparent)]
    Counters(#[from] leaklab_core::Error),

    /// A capture backend refused or aborted the capture.
    #[error("capture backend failed: {0}")]
    Backend(String),
}
