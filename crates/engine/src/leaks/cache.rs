//! Cache leak: unbounded growth behind a size limit nothing enforces.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

use super::{LeakReport, PatternStats, leak_chunk};

/// Tuning knobs for the Cache pattern.
#[derive(Debug, Clone)]
pub struct CacheLeakConfig {
    /// Bytes per inserted entry.
    pub entry_bytes: usize,
    /// Insertion interval.
    pub tick: Duration,
    /// Advertised size limit. Reported in stats and never applied;
    /// the gap between the two is the point.
    pub max_size: usize,
}

impl Default for CacheLeakConfig {
    fn default() -> Self {
        Self {
            entry_bytes: 8 * 1024 * 1024,
            tick: Duration::from_secs(1),
            max_size: 100,
        }
    }
}

/// Quantitative state of the Cache pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Entries currently held.
    pub size: usize,
    /// The limit the cache claims to honor.
    pub max_size: usize,
    /// Estimated retained bytes.
    pub estimated_bytes: u64,
    /// Whether accumulation is active.
    pub is_leaking: bool,
    /// When the current run began.
    pub started_at: Option<DateTime<Utc>>,
}

struct CacheState {
    task: Option<JoinHandle<()>>,
    started_at: Option<DateTime<Utc>>,
}

/// Reproduces a memoization cache with no eviction: entries are keyed so
/// each insert is a distinct retained value, and `max_size` is consulted
/// by nobody.
pub struct CacheLeak {
    config: CacheLeakConfig,
    state: Mutex<CacheState>,
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    next_key: Arc<AtomicU64>,
}

impl CacheLeak {
    /// Create an idle generator.
    #[must_use]
    pub fn new(config: CacheLeakConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CacheState {
                task: None,
                started_at: None,
            }),
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_key: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Begin inserting entries. A second start while running is a no-op.
    pub async fn start(&self) -> LeakReport {
        let mut state = self.state.lock().await;
        if state.task.is_some() {
            let stats = self.stats_for(&state).await;
            return LeakReport {
                message: "Cache leak is already running".to_string(),
                stats: PatternStats::Cache(stats),
            };
        }

        state.started_at = Some(Utc::now());

        let entries = Arc::clone(&self.entries);
        let next_key = Arc::clone(&self.next_key);
        let entry_bytes = self.config.entry_bytes;
        let tick = self.config.tick;
        let handle = tokio::spawn(async move {
            let mut ticker = interval(tick);
            ticker.tick().await; // First tick completes immediately
            loop {
                ticker.tick().await;
                let n = next_key.fetch_add(1, Ordering::Relaxed);
                let mut entries = entries.lock().await;
                entries.insert(format!("cache-entry-{n}"), leak_chunk(entry_bytes));
                debug!(size = entries.len(), "cache leak inserted entry");
            }
        });
        state.task = Some(handle);

        info!(
            entry_bytes = self.config.entry_bytes,
            "cache leak started"
        );

        let stats = self.stats_for(&state).await;
        LeakReport {
            message: "Cache leak started".to_string(),
            stats: PatternStats::Cache(stats),
        }
    }

    /// Stop inserting and drop every entry.
    pub async fn stop(&self) -> LeakReport {
        let mut state = self.state.lock().await;
        let Some(handle) = state.task.take() else {
            let stats = self.stats_for(&state).await;
            return LeakReport {
                message: "Cache leak is not running".to_string(),
                stats: PatternStats::Cache(stats),
            };
        };

        handle.abort();
        let _ = handle.await;

        let mut entries = self.entries.lock().await;
        let cleared = entries.len();
        entries.clear();
        drop(entries);

        info!(cleared_entries = cleared, "cache leak stopped");

        let stats = self.stats_for(&state).await;
        LeakReport {
            message: format!("Cache leak stopped; cleared {cleared} entries"),
            stats: PatternStats::Cache(stats),
        }
    }

    /// Report current state without touching it.
    pub async fn status(&self) -> LeakReport {
        let state = self.state.lock().await;
        let stats = self.stats_for(&state).await;
        let message = if stats.is_leaking {
            "Cache leak is running"
        } else {
            "Cache leak is idle"
        };
        LeakReport {
            message: message.to_string(),
            stats: PatternStats::Cache(stats),
        }
    }

    async fn stats_for(&self, state: &CacheState) -> CacheStats {
        let size = self.entries.lock().await.len();
        CacheStats {
            size,
            max_size: self.config.max_size,
            estimated_bytes: (size as u64).saturating_mul(self.config.entry_bytes as u64),
            is_leaking: state.task.is_some(),
            started_at: state.started_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn fast_leak() -> CacheLeak {
        CacheLeak::new(CacheLeakConfig {
            entry_bytes: 1024,
            tick: Duration::from_millis(10),
            max_size: 100,
        })
    }

    fn cache_stats(report: &LeakReport) -> CacheStats {
        match &report.stats {
            PatternStats::Cache(stats) => stats.clone(),
            other => panic!("expected cache stats, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_size_grows_and_nothing_is_evicted() {
        // Setup
        let leak = fast_leak();
        leak.start().await;

        // Execute
        tokio::time::sleep(Duration::from_millis(60)).await;
        let first = cache_stats(&leak.status().await);
        tokio::time::sleep(Duration::from_millis(60)).await;
        let second = cache_stats(&leak.status().await);

        // Verify
        assert!(first.size >= 2, "expected growth, got {}", first.size);
        assert!(
            second.size >= 3,
            "expected at least 3 entries after 12 ticks, got {}",
            second.size
        );
        assert!(
            second.size >= first.size,
            "size shrank from {} to {}",
            first.size,
            second.size
        );
        assert_eq!(first.max_size, 100);
        assert_eq!(second.max_size, 100);

        leak.stop().await;
    }

    #[tokio::test]
    async fn test_start_while_running_is_a_noop() {
        let leak = fast_leak();

        leak.start().await;
        let report = leak.start().await;

        assert_eq!(report.message, "Cache leak is already running");
        assert!(cache_stats(&report).is_leaking);

        leak.stop().await;
    }

    #[tokio::test]
    async fn test_stop_clears_entries() {
        let leak = fast_leak();
        leak.start().await;
        tokio::time::sleep(Duration::from_millis(60)).await;

        let report = leak.stop().await;

        let stats = cache_stats(&report);
        assert_eq!(stats.size, 0);
        assert!(!stats.is_leaking);
        assert!(report.message.starts_with("Cache leak stopped"));
    }

    #[tokio::test]
    async fn test_stop_when_idle_reports_not_running() {
        let leak = fast_leak();

        let report = leak.stop().await;

        assert_eq!(report.message, "Cache leak is not running");
        assert!(!cache_stats(&report).is_leaking);
    }

    #[tokio::test]
    async fn test_estimated_bytes_tracks_entry_count() {
        let leak = fast_leak();
        leak.start().await;
        tokio::time::sleep(Duration::from_millis(60)).await;

        let stats = cache_stats(&leak.status().await);

        assert_eq!(stats.estimated_bytes, (stats.size as u64) * 1024);

        leak.stop().await;
    }
}
