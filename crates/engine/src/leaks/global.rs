//! Global-variable leak: chunks appended to a process-wide store that
//! outlives the code filling it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

use super::{LeakReport, PatternStats, leak_chunk};

/// Process-wide retained collection the GlobalVariable pattern pollutes.
///
/// Constructed once at the application root and injected. Contents are
/// deliberately NOT cleared when the generator stops; surviving the code
/// that filled it is the defect on display.
pub struct GlobalStore {
    chunks: Mutex<Vec<Vec<u8>>>,
}

impl GlobalStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chunks: Mutex::new(Vec::new()),
        }
    }

    /// Append one chunk.
    pub async fn push(&self, chunk: Vec<u8>) {
        self.chunks.lock().await.push(chunk);
    }

    /// Number of retained chunks.
    pub async fn len(&self) -> usize {
        self.chunks.lock().await.len()
    }

    /// Whether the store holds nothing.
    pub async fn is_empty(&self) -> bool {
        self.chunks.lock().await.is_empty()
    }
}

impl Default for GlobalStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Tuning knobs for the GlobalVariable pattern.
#[derive(Debug, Clone)]
pub struct GlobalLeakConfig {
    /// Bytes appended per tick.
    pub chunk_bytes: usize,
    /// Accumulation interval.
    pub tick: Duration,
    /// Deadline after which the run stops itself. The store keeps its
    /// contents; only accumulation ends.
    pub auto_stop_after: Duration,
}

impl Default for GlobalLeakConfig {
    fn default() -> Self {
        Self {
            chunk_bytes: 1024 * 1024,
            tick: Duration::from_secs(1),
            auto_stop_after: Duration::from_secs(10),
        }
    }
}

/// Quantitative state of the GlobalVariable pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalStats {
    /// Chunks in the shared store, across all runs.
    pub chunks: usize,
    /// Estimated retained bytes.
    pub estimated_bytes: u64,
    /// Auto-stop deadline in milliseconds.
    pub auto_stop_after_ms: u64,
    /// Whether accumulation is active.
    pub is_leaking: bool,
    /// When the current run began.
    pub started_at: Option<DateTime<Utc>>,
}

struct GlobalState {
    task: Option<JoinHandle<()>>,
    started_at: Option<DateTime<Utc>>,
}

/// Appends chunks to the shared [`GlobalStore`] until stopped or the
/// auto-stop deadline fires, whichever comes first. The store is never
/// drained by this generator, so repeated runs pile on.
pub struct GlobalLeak {
    config: GlobalLeakConfig,
    store: Arc<GlobalStore>,
    state: Mutex<GlobalState>,
    running: Arc<AtomicBool>,
}

impl GlobalLeak {
    /// Create an idle generator over the shared store.
    #[must_use]
    pub fn new(config: GlobalLeakConfig, store: Arc<GlobalStore>) -> Self {
        Self {
            config,
            store,
            state: Mutex::new(GlobalState {
                task: None,
                started_at: None,
            }),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Begin appending to the store. A second start while running is a
    /// no-op; a start after auto-stop begins a fresh run.
    pub async fn start(&self) -> LeakReport {
        let mut state = self.state.lock().await;
        if self.running.load(Ordering::Acquire) {
            let stats = self.stats_for(&state).await;
            return LeakReport {
                message: "Global-variable leak is already running".to_string(),
                stats: PatternStats::Global(stats),
            };
        }

        // Reap a handle left behind by an auto-stopped run.
        if let Some(handle) = state.task.take() {
            handle.abort();
        }

        self.running.store(true, Ordering::Release);
        state.started_at = Some(Utc::now());

        let store = Arc::clone(&self.store);
        let running = Arc::clone(&self.running);
        let chunk_bytes = self.config.chunk_bytes;
        let tick = self.config.tick;
        let deadline = tokio::time::Instant::now() + self.config.auto_stop_after;
        let handle = tokio::spawn(async move {
            let mut ticker = interval(tick);
            ticker.tick().await; // First tick completes immediately
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        store.push(leak_chunk(chunk_bytes)).await;
                        let chunks = store.len().await;
                        debug!(chunks, "global leak tick");
                    }
                    () = tokio::time::sleep_until(deadline) => {
                        running.store(false, Ordering::Release);
                        info!("global-variable leak auto-stopped at deadline");
                        break;
                    }
                }
            }
        });
        state.task = Some(handle);

        info!(
            auto_stop_after_ms = self.config.auto_stop_after.as_millis() as u64,
            "global-variable leak started"
        );

        let stats = self.stats_for(&state).await;
        LeakReport {
            message: "Global-variable leak started".to_string(),
            stats: PatternStats::Global(stats),
        }
    }

    /// End the current run. The store keeps every chunk.
    pub async fn stop(&self) -> LeakReport {
        let mut state = self.state.lock().await;
        if !self.running.load(Ordering::Acquire) {
            if let Some(handle) = state.task.take() {
                handle.abort();
            }
            let stats = self.stats_for(&state).await;
            return LeakReport {
                message: "Global-variable leak is not running".to_string(),
                stats: PatternStats::Global(stats),
            };
        }

        self.running.store(false, Ordering::Release);
        if let Some(handle) = state.task.take() {
            handle.abort();
            let _ = handle.await;
        }

        let stats = self.stats_for(&state).await;
        info!(retained_chunks = stats.chunks, "global-variable leak stopped");
        LeakReport {
            message: format!(
                "Global-variable leak stopped; {} chunk(s) remain in the global store",
                stats.chunks
            ),
            stats: PatternStats::Global(stats),
        }
    }

    /// Report current state without touching it.
    pub async fn status(&self) -> LeakReport {
        let state = self.state.lock().await;
        let stats = self.stats_for(&state).await;
        let message = if stats.is_leaking {
            "Global-variable leak is running"
        } else {
            "Global-variable leak is idle"
        };
        LeakReport {
            message: message.to_string(),
            stats: PatternStats::Global(stats),
        }
    }

    async fn stats_for(&self, state: &GlobalState) -> GlobalStats {
        let chunks = self.store.len().await;
        GlobalStats {
            chunks,
            estimated_bytes: (chunks as u64).saturating_mul(self.config.chunk_bytes as u64),
            auto_stop_after_ms: self.config.auto_stop_after.as_millis() as u64,
            is_leaking: self.running.load(Ordering::Acquire),
            started_at: state.started_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn fast_leak(auto_stop_after: Duration) -> GlobalLeak {
        GlobalLeak::new(
            GlobalLeakConfig {
                chunk_bytes: 1024,
                tick: Duration::from_millis(10),
                auto_stop_after,
            },
            Arc::new(GlobalStore::new()),
        )
    }

    fn global_stats(report: &LeakReport) -> GlobalStats {
        match &report.stats {
            PatternStats::Global(stats) => stats.clone(),
            other => panic!("expected global stats, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_stops_itself_at_the_deadline() {
        // Setup
        let leak = fast_leak(Duration::from_millis(60));

        // Execute
        leak.start().await;
        tokio::time::sleep(Duration::from_millis(150)).await;
        let stats = global_stats(&leak.status().await);

        // Verify: accumulation ended on its own, the store kept its chunks
        assert!(!stats.is_leaking);
        assert!(
            stats.chunks >= 1,
            "expected retained chunks, got {}",
            stats.chunks
        );
    }

    #[tokio::test]
    async fn test_store_survives_an_explicit_stop() {
        let leak = fast_leak(Duration::from_secs(10));
        leak.start().await;
        tokio::time::sleep(Duration::from_millis(60)).await;

        let report = leak.stop().await;

        let stats = global_stats(&report);
        assert!(stats.chunks >= 2, "store was drained: {}", stats.chunks);
        assert!(!stats.is_leaking);
        assert!(report.message.contains("remain in the global store"));
    }

    #[tokio::test]
    async fn test_restart_after_auto_stop_piles_onto_the_store() {
        let leak = fast_leak(Duration::from_millis(50));

        leak.start().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        let after_first = global_stats(&leak.status().await);
        assert!(!after_first.is_leaking);

        let report = leak.start().await;
        assert_eq!(report.message, "Global-variable leak started");
        tokio::time::sleep(Duration::from_millis(30)).await;

        let stats = global_stats(&leak.status().await);
        assert!(stats.is_leaking);
        assert!(
            stats.chunks >= after_first.chunks,
            "second run must not drain the store"
        );

        leak.stop().await;
    }

    #[tokio::test]
    async fn test_stop_when_idle_reports_not_running() {
        let leak = fast_leak(Duration::from_secs(10));

        let report = leak.stop().await;

        assert_eq!(report.message, "Global-variable leak is not running");
    }

    #[tokio::test]
    async fn test_start_while_running_is_a_noop() {
        let leak = fast_leak(Duration::from_secs(10));

        leak.start().await;
        let report = leak.start().await;

        assert_eq!(report.message, "Global-variable leak is already running");

        leak.stop().await;
    }

    #[tokio::test]
    async fn test_shared_store_is_visible_across_generators() {
        let store = Arc::new(GlobalStore::new());
        store.push(vec![0xA5; 16]).await;

        let leak = GlobalLeak::new(
            GlobalLeakConfig {
                chunk_bytes: 1024,
                tick: Duration::from_millis(10),
                auto_stop_after: Duration::from_secs(10),
            },
            Arc::clone(&store),
        );

        let stats = global_stats(&leak.status().await);
        assert_eq!(stats.chunks, 1);
        assert!(!store.is_empty().await);
    }
}
