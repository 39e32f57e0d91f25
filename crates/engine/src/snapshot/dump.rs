//! Capture backends for snapshot artifacts.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use leaklab_core::MemoryCounters;

use crate::error::{Error, Result};

/// One captured document: everything the tool knows about process memory
/// at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct HeapDocument {
    /// Capture wall-clock time.
    pub captured_at: DateTime<Utc>,
    /// Capturing process id.
    pub pid: u32,
    /// Raw procfs counters.
    pub memory: MemoryCounters,
}

/// A capture backend writing one artifact per call.
#[async_trait]
pub trait HeapDump: Send + Sync {
    /// Capture a snapshot into `path`, returning the bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying read or write fails.
    async fn capture(&self, path: &Path) -> Result<u64>;

    /// Best-effort hint to collect garbage before a capture. The default
    /// does nothing; there is no managed heap to nudge.
    async fn collect_hint(&self) {}
}

/// Production backend: serializes the process's procfs counters as a
/// JSON document.
pub struct ProcessHeapDump;

#[async_trait]
impl HeapDump for ProcessHeapDump {
    async fn capture(&self, path: &Path) -> Result<u64> {
        let document = HeapDocument {
            captured_at: Utc::now(),
            pid: std::process::id(),
            memory: MemoryCounters::read_self()?,
        };
        let body = serde_json::to_vec_pretty(&document)?;
        tokio::fs::write(path, &body)
            .await
            .map_err(|source| Error::Write {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), bytes = body.len(), "snapshot written");
        Ok(body.len() as u64)
    }

    async fn collect_hint(&self) {
        debug!("collect hint ignored; no managed heap");
    }
}
