//! Timer leak: interval tasks registered without ever being cleared.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

use super::{LeakReport, PatternStats, leak_chunk};

/// Tuning knobs for the Timer pattern.
#[derive(Debug, Clone)]
pub struct TimerLeakConfig {
    /// Bytes appended per tick by each interval task.
    pub chunk_bytes: usize,
    /// Accumulation interval.
    pub tick: Duration,
}

impl Default for TimerLeakConfig {
    fn default() -> Self {
        Self {
            chunk_bytes: 5 * 1024 * 1024,
            tick: Duration::from_secs(1),
        }
    }
}

/// Quantitative state of the Timer pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerStats {
    /// Interval tasks currently accumulating.
    pub active_timers: usize,
    /// Tasks cancelled by the most recent stop.
    pub stopped_timers: usize,
    /// Chunks retained so far.
    pub chunks_allocated: usize,
    /// Estimated retained bytes.
    pub estimated_bytes: u64,
    /// Whether accumulation is active.
    pub is_leaking: bool,
    /// When the current run began.
    pub started_at: Option<DateTime<Utc>>,
}

struct TimerState {
    tasks: Vec<JoinHandle<()>>,
    stopped_timers: usize,
    started_at: Option<DateTime<Utc>>,
}

/// Reproduces callers piling up `setInterval`-style timers without keeping
/// handles: every `start` stacks one more interval task, and none of them
/// is collapsed into another. Internally each handle IS tracked so `stop`
/// can cancel the lot.
pub struct TimerLeak {
    config: TimerLeakConfig,
    state: Mutex<TimerState>,
    chunks: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl TimerLeak {
    /// Create an idle generator.
    #[must_use]
    pub fn new(config: TimerLeakConfig) -> Self {
        Self {
            config,
            state: Mutex::new(TimerState {
                tasks: Vec::new(),
                stopped_timers: 0,
                started_at: None,
            }),
            chunks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register one more accumulation task. Repeated calls stack
    /// deliberately; that stacking is the lesson.
    pub async fn start(&self) -> LeakReport {
        let mut state = self.state.lock().await;
        if state.tasks.is_empty() {
            state.started_at = Some(Utc::now());
            state.stopped_timers = 0;
        }

        let chunks = Arc::clone(&self.chunks);
        let chunk_bytes = self.config.chunk_bytes;
        let tick = self.config.tick;
        let handle = tokio::spawn(async move {
            let mut ticker = interval(tick);
            ticker.tick().await; // First tick completes immediately
            loop {
                ticker.tick().await;
                let mut chunks = chunks.lock().await;
                chunks.push(leak_chunk(chunk_bytes));
                debug!(total_chunks = chunks.len(), "timer leak tick");
            }
        });
        state.tasks.push(handle);

        info!(
            active_timers = state.tasks.len(),
            "timer leak registered another interval"
        );

        let chunk_count = self.chunks.lock().await.len();
        let stats = self.stats_for(&state, chunk_count);
        LeakReport {
            message: format!(
                "Timer leak started; {} interval task(s) active",
                state.tasks.len()
            ),
            stats: PatternStats::Timer(stats),
        }
    }

    /// Cancel every interval task and release the retained chunks.
    ///
    /// Handles are awaited after abort so no tick can land once this
    /// returns.
    pub async fn stop(&self) -> LeakReport {
        let mut state = self.state.lock().await;
        if state.tasks.is_empty() {
            let chunk_count = self.chunks.lock().await.len();
            let stats = self.stats_for(&state, chunk_count);
            return LeakReport {
                message: "Timer leak is not running".to_string(),
                stats: PatternStats::Timer(stats),
            };
        }

        let handles: Vec<JoinHandle<()>> = state.tasks.drain(..).collect();
        let stopped = handles.len();
        for handle in handles {
            handle.abort();
            let _ = handle.await;
        }
        state.stopped_timers = stopped;

        let mut chunks = self.chunks.lock().await;
        let freed = chunks.len();
        chunks.clear();
        drop(chunks);

        info!(
            stopped_timers = stopped,
            freed_chunks = freed,
            "timer leak stopped"
        );

        let stats = self.stats_for(&state, 0);
        LeakReport {
            message: format!("Timer leak stopped; cancelled {stopped} interval task(s)"),
            stats: PatternStats::Timer(stats),
        }
    }

    /// Report current state without touching it.
    pub async fn status(&self) -> LeakReport {
        let state = self.state.lock().await;
        let chunk_count = self.chunks.lock().await.len();
        let stats = self.stats_for(&state, chunk_count);
        let message = if stats.is_leaking {
            "Timer leak is running"
        } else {
            "Timer leak is idle"
        };
        LeakReport {
            message: message.to_string(),
            stats: PatternStats::Timer(stats),
        }
    }

    fn stats_for(&self, state: &TimerState, chunk_count: usize) -> TimerStats {
        TimerStats {
            active_timers: state.tasks.len(),
            stopped_timers: state.stopped_timers,
            chunks_allocated: chunk_count,
            estimated_bytes: (chunk_count as u64).saturating_mul(self.config.chunk_bytes as u64),
            is_leaking: !state.tasks.is_empty(),
            started_at: state.started_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn fast_leak() -> TimerLeak {
        TimerLeak::new(TimerLeakConfig {
            chunk_bytes: 1024,
            tick: Duration::from_millis(10),
        })
    }

    fn timer_stats(report: &LeakReport) -> TimerStats {
        match &report.stats {
            PatternStats::Timer(stats) => stats.clone(),
            other => panic!("expected timer stats, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_each_start_registers_another_interval() {
        // Setup
        let leak = fast_leak();

        // Execute
        leak.start().await;
        leak.start().await;
        let report = leak.start().await;

        // Verify
        let stats = timer_stats(&report);
        assert_eq!(stats.active_timers, 3);
        assert!(stats.is_leaking);
        assert!(stats.started_at.is_some());

        leak.stop().await;
    }

    #[tokio::test]
    async fn test_chunks_accumulate_while_running() {
        let leak = fast_leak();

        leak.start().await;
        tokio::time::sleep(Duration::from_millis(120)).await;
        let report = leak.status().await;

        let stats = timer_stats(&report);
        assert!(
            stats.chunks_allocated >= 3,
            "expected at least 3 chunks, got {}",
            stats.chunks_allocated
        );
        assert_eq!(
            stats.estimated_bytes,
            (stats.chunks_allocated as u64) * 1024
        );

        leak.stop().await;
    }

    #[tokio::test]
    async fn test_stop_cancels_all_tasks_and_clears_chunks() {
        let leak = fast_leak();
        leak.start().await;
        leak.start().await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let report = leak.stop().await;

        let stats = timer_stats(&report);
        assert_eq!(stats.active_timers, 0);
        assert_eq!(stats.stopped_timers, 2);
        assert_eq!(stats.chunks_allocated, 0);
        assert!(!stats.is_leaking);

        // No tick may land after stop returns.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let after = timer_stats(&leak.status().await);
        assert_eq!(after.chunks_allocated, 0);
    }

    #[tokio::test]
    async fn test_stop_when_idle_reports_not_running() {
        let leak = fast_leak();

        let report = leak.stop().await;

        assert_eq!(report.message, "Timer leak is not running");
        let stats = timer_stats(&report);
        assert_eq!(stats.active_timers, 0);
        assert_eq!(stats.stopped_timers, 0);
    }

    #[tokio::test]
    async fn test_restart_resets_stopped_counter_but_keeps_started_at() {
        let leak = fast_leak();

        leak.start().await;
        let stopped = timer_stats(&leak.stop().await);
        assert_eq!(stopped.stopped_timers, 1);
        assert!(stopped.started_at.is_some());

        let restarted = timer_stats(&leak.start().await);
        assert_eq!(restarted.stopped_timers, 0);
        assert_eq!(restarted.active_timers, 1);

        leak.stop().await;
    }
}
