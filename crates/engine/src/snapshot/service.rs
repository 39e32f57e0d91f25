//! Snapshot orchestration: one-shot captures, fixed series, auto loops.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, sleep};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::snapshot::dump::{HeapDump, ProcessHeapDump};

/// Descriptor for one artifact on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotArtifact {
    /// File name inside the snapshot directory.
    pub filename: String,
    /// Bytes written.
    pub approximate_size_bytes: u64,
    /// When the capture completed.
    pub created_at: DateTime<Utc>,
}

/// Options shared by series and auto captures.
#[derive(Debug, Clone)]
pub struct SeriesOptions {
    /// Label prefix for artifact filenames.
    pub label: String,
    /// Delay between captures.
    pub interval: Duration,
    /// Ask the backend for a collection hint before each capture.
    pub before_gc: bool,
}

impl Default for SeriesOptions {
    fn default() -> Self {
        Self {
            label: "snap".to_string(),
            interval: Duration::from_secs(1),
            before_gc: false,
        }
    }
}

/// Outcome of a fixed-count series. Partial success is explicit:
/// `artifacts` holds everything captured before `error`, if any, ended
/// the series early.
#[derive(Debug)]
pub struct SnapshotSeries {
    /// Artifacts produced, in capture order.
    pub artifacts: Vec<SnapshotArtifact>,
    /// The failure that cut the series short.
    pub error: Option<Error>,
}

impl SnapshotSeries {
    /// Whether every requested capture completed.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Produces heap snapshot artifacts in a designated directory.
///
/// Cheap to clone; clones share the filename sequence counter so
/// concurrent captures never collide.
#[derive(Clone)]
pub struct SnapshotService {
    dir: PathBuf,
    dumper: Arc<dyn HeapDump>,
    sequence: Arc<AtomicU64>,
}

impl SnapshotService {
    /// Create a service writing real process dumps into `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_dumper(dir, Arc::new(ProcessHeapDump))
    }

    /// Create a service with a custom capture backend.
    #[must_use]
    pub fn with_dumper(dir: impl Into<PathBuf>, dumper: Arc<dyn HeapDump>) -> Self {
        Self {
            dir: dir.into(),
            dumper,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The directory artifacts land in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the snapshot directory if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| Error::CreateDir {
                path: self.dir.clone(),
                source,
            })
    }

    /// Perform exactly one capture tagged with `label`.
    ///
    /// # Errors
    ///
    /// Propagates capture backend failures.
    pub async fn write_snapshot(&self, label: &str) -> Result<SnapshotArtifact> {
        let filename = self.next_filename(label);
        let path = self.dir.join(&filename);
        let approximate_size_bytes = self.dumper.capture(&path).await?;
        let artifact = SnapshotArtifact {
            filename,
            approximate_size_bytes,
            created_at: Utc::now(),
        };
        info!(
            filename = %artifact.filename,
            bytes = artifact.approximate_size_bytes,
            "snapshot captured"
        );
        Ok(artifact)
    }

    /// Capture `count` snapshots, sleeping `options.interval` between
    /// consecutive captures. The first capture happens immediately.
    ///
    /// A failure ends the series early; artifacts captured before it are
    /// returned alongside the error.
    pub async fn snap_every(&self, count: usize, options: &SeriesOptions) -> SnapshotSeries {
        let mut artifacts = Vec::with_capacity(count);
        for i in 0..count {
            if i > 0 {
                sleep(options.interval).await;
            }
            if options.before_gc {
                self.dumper.collect_hint().await;
            }
            match self.write_snapshot(&options.label).await {
                Ok(artifact) => artifacts.push(artifact),
                Err(error) => {
                    warn!(
                        error = %error,
                        captured = artifacts.len(),
                        requested = count,
                        "snapshot series ended early"
                    );
                    return SnapshotSeries {
                        artifacts,
                        error: Some(error),
                    };
                }
            }
        }
        SnapshotSeries {
            artifacts,
            error: None,
        }
    }

    /// Start a background loop capturing on every interval until the
    /// returned controller is stopped.
    #[must_use]
    pub fn start_auto(&self, options: SeriesOptions) -> AutoSnapshotController {
        AutoSnapshotController::start(self.clone(), options)
    }

    fn next_filename(&self, label: &str) -> String {
        let label = sanitize_label(label);
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{label}-{stamp}-{seq:04}.heapsnapshot")
    }
}

/// Keep labels safe to use as filename prefixes.
fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "snapshot".to_string()
    } else {
        cleaned
    }
}

/// Handle to a running auto-snapshot loop.
///
/// Stop it to collect the artifacts it produced; dropping it without
/// stopping aborts the loop.
pub struct AutoSnapshotController {
    shutdown_tx: mpsc::Sender<()>,
    handle: Option<JoinHandle<Vec<SnapshotArtifact>>>,
}

impl AutoSnapshotController {
    fn start(service: SnapshotService, options: SeriesOptions) -> Self {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(options.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await; // First tick completes immediately
            let mut artifacts = Vec::new();
            loop {
                // Polled in order: a slow capture leaves ticks pending,
                // and none of them may start another capture once a
                // stop has been requested.
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => break,
                    _ = ticker.tick() => {
                        if options.before_gc {
                            service.dumper.collect_hint().await;
                        }
                        match service.write_snapshot(&options.label).await {
                            Ok(artifact) => artifacts.push(artifact),
                            Err(error) => {
                                warn!(error = %error, "auto snapshot capture failed");
                            }
                        }
                    }
                }
            }
            info!(captured = artifacts.len(), "auto snapshot loop stopped");
            artifacts
        });
        Self {
            shutdown_tx,
            handle: Some(handle),
        }
    }

    /// Stop the loop and return every artifact it captured.
    ///
    /// An in-flight capture finishes first and is included; no new
    /// capture starts once the stop has been requested. A second stop
    /// returns an empty list.
    pub async fn stop(&mut self) -> Vec<SnapshotArtifact> {
        let Some(handle) = self.handle.take() else {
            return Vec::new();
        };
        let _ = self.shutdown_tx.send(()).await;
        match handle.await {
            Ok(artifacts) => artifacts,
            Err(error) => {
                warn!(error = %error, "auto snapshot loop task failed");
                Vec::new()
            }
        }
    }

    /// Whether the controller has already been stopped.
    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        self.handle.is_none()
    }
}

impl Drop for AutoSnapshotController {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}
