//! Closure leak: function values capturing large buffers, retained forever.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

use super::{LeakReport, PatternStats, leak_chunk};

/// A retained closure. Calling it returns the captured buffer length,
/// which is also what keeps the buffer alive.
type RetainedClosure = Box<dyn Fn() -> usize + Send + Sync>;

/// Tuning knobs for the Closure pattern.
#[derive(Debug, Clone)]
pub struct ClosureLeakConfig {
    /// Bytes captured by each retained closure.
    pub capture_bytes: usize,
    /// Accumulation interval.
    pub tick: Duration,
}

impl Default for ClosureLeakConfig {
    fn default() -> Self {
        Self {
            capture_bytes: 10 * 1024 * 1024,
            tick: Duration::from_secs(1),
        }
    }
}

/// Quantitative state of the Closure pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosureStats {
    /// Closures currently retained.
    pub closures_retained: usize,
    /// Estimated captured bytes.
    pub estimated_bytes: u64,
    /// Whether accumulation is active.
    pub is_leaking: bool,
    /// When the current run began.
    pub started_at: Option<DateTime<Utc>>,
}

struct ClosureState {
    task: Option<JoinHandle<()>>,
    started_at: Option<DateTime<Utc>>,
}

/// Reproduces callbacks whose captured environment nobody releases: each
/// tick boxes a closure over a fresh buffer and pushes it onto a list
/// that only `stop` ever drains.
pub struct ClosureLeak {
    config: ClosureLeakConfig,
    state: Mutex<ClosureState>,
    retained: Arc<Mutex<Vec<RetainedClosure>>>,
}

impl ClosureLeak {
    /// Create an idle generator.
    #[must_use]
    pub fn new(config: ClosureLeakConfig) -> Self {
        Self {
            config,
            state: Mutex::new(ClosureState {
                task: None,
                started_at: None,
            }),
            retained: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Begin retaining closures. A second start while running is a no-op.
    pub async fn start(&self) -> LeakReport {
        let mut state = self.state.lock().await;
        if state.task.is_some() {
            let stats = self.stats_for(&state).await;
            return LeakReport {
                message: "Closure leak is already running".to_string(),
                stats: PatternStats::Closure(stats),
            };
        }

        state.started_at = Some(Utc::now());

        let retained = Arc::clone(&self.retained);
        let capture_bytes = self.config.capture_bytes;
        let tick = self.config.tick;
        let handle = tokio::spawn(async move {
            let mut ticker = interval(tick);
            ticker.tick().await; // First tick completes immediately
            loop {
                ticker.tick().await;
                let captured = leak_chunk(capture_bytes);
                let closure: RetainedClosure = Box::new(move || captured.len());
                let mut retained = retained.lock().await;
                retained.push(closure);
                debug!(closures_retained = retained.len(), "closure leak tick");
            }
        });
        state.task = Some(handle);

        info!(
            capture_bytes = self.config.capture_bytes,
            "closure leak started"
        );

        let stats = self.stats_for(&state).await;
        LeakReport {
            message: "Closure leak started".to_string(),
            stats: PatternStats::Closure(stats),
        }
    }

    /// Stop accumulating and release every retained closure.
    pub async fn stop(&self) -> LeakReport {
        let mut state = self.state.lock().await;
        let Some(handle) = state.task.take() else {
            let stats = self.stats_for(&state).await;
            return LeakReport {
                message: "Closure leak is not running".to_string(),
                stats: PatternStats::Closure(stats),
            };
        };

        handle.abort();
        let _ = handle.await;

        let mut retained = self.retained.lock().await;
        let released = retained.len();
        retained.clear();
        drop(retained);

        info!(released_closures = released, "closure leak stopped");

        let stats = self.stats_for(&state).await;
        LeakReport {
            message: format!("Closure leak stopped; released {released} closure(s)"),
            stats: PatternStats::Closure(stats),
        }
    }

    /// Report current state without touching it.
    pub async fn status(&self) -> LeakReport {
        let state = self.state.lock().await;
        let stats = self.stats_for(&state).await;
        let message = if stats.is_leaking {
            "Closure leak is running"
        } else {
            "Closure leak is idle"
        };
        LeakReport {
            message: message.to_string(),
            stats: PatternStats::Closure(stats),
        }
    }

    async fn stats_for(&self, state: &ClosureState) -> ClosureStats {
        let closures_retained = self.retained.lock().await.len();
        ClosureStats {
            closures_retained,
            estimated_bytes: (closures_retained as u64)
                .saturating_mul(self.config.capture_bytes as u64),
            is_leaking: state.task.is_some(),
            started_at: state.started_at,
        }
    }
}
