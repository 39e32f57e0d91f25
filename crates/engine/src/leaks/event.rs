//! Event leak: listeners registered every tick and never unregistered.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

use super::emitter::{Emitter, Handler};
use super::{LeakReport, PatternStats, leak_chunk};

/// Tuning knobs for the Event pattern.
#[derive(Debug, Clone)]
pub struct EventLeakConfig {
    /// Bytes captured by each registered listener.
    pub payload_bytes: usize,
    /// Registration interval.
    pub tick: Duration,
}

impl Default for EventLeakConfig {
    fn default() -> Self {
        Self {
            payload_bytes: 8 * 1024 * 1024,
            tick: Duration::from_secs(1),
        }
    }
}

/// Quantitative state of the Event pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventStats {
    /// Listeners currently registered on the leak channel.
    pub listeners: usize,
    /// Handler invocations across all triggers, cumulative for the
    /// process lifetime.
    pub events_fired: u64,
    /// Estimated bytes captured by the listeners.
    pub estimated_bytes: u64,
    /// Whether accumulation is active.
    pub is_leaking: bool,
    /// When the current run began.
    pub started_at: Option<DateTime<Utc>>,
}

struct EventState {
    task: Option<JoinHandle<()>>,
    started_at: Option<DateTime<Utc>>,
}

/// Reproduces `addEventListener` without the matching remove: each tick
/// registers one more handler closing over a payload buffer, and the
/// emitter keeps them all reachable.
pub struct EventLeak {
    config: EventLeakConfig,
    emitter: Arc<Emitter>,
    state: Mutex<EventState>,
    fired: Arc<AtomicU64>,
}

impl EventLeak {
    /// Channel the generator registers its listeners on.
    pub const CHANNEL: &'static str = "leak-demo";

    /// Create an idle generator over a shared emitter.
    #[must_use]
    pub fn new(config: EventLeakConfig, emitter: Arc<Emitter>) -> Self {
        Self {
            config,
            emitter,
            state: Mutex::new(EventState {
                task: None,
                started_at: None,
            }),
            fired: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Begin registering listeners. A second start while running is a
    /// no-op.
    pub async fn start(&self) -> LeakReport {
        let mut state = self.state.lock().await;
        if state.task.is_some() {
            let stats = self.stats_for(&state).await;
            return LeakReport {
                message: "Event leak is already running".to_string(),
                stats: PatternStats::Event(stats),
            };
        }

        state.started_at = Some(Utc::now());

        let emitter = Arc::clone(&self.emitter);
        let fired = Arc::clone(&self.fired);
        let payload_bytes = self.config.payload_bytes;
        let tick = self.config.tick;
        let handle = tokio::spawn(async move {
            let mut ticker = interval(tick);
            ticker.tick().await; // First tick completes immediately
            loop {
                ticker.tick().await;
                let payload = leak_chunk(payload_bytes);
                let fired = Arc::clone(&fired);
                let handler: Handler = Box::new(move || {
                    fired.fetch_add(1, Ordering::Relaxed);
                    debug!(payload_bytes = payload.len(), "leaked listener fired");
                });
                let id = emitter.on(Self::CHANNEL, handler).await;
                debug!(listener_id = id, "event leak registered listener");
            }
        });
        state.task = Some(handle);

        info!(
            payload_bytes = self.config.payload_bytes,
            "event leak started"
        );

        let stats = self.stats_for(&state).await;
        LeakReport {
            message: "Event leak started".to_string(),
            stats: PatternStats::Event(stats),
        }
    }

    /// Stop registering and sweep the leak channel.
    pub async fn stop(&self) -> LeakReport {
        let mut state = self.state.lock().await;
        let Some(handle) = state.task.take() else {
            let stats = self.stats_for(&state).await;
            return LeakReport {
                message: "Event leak is not running".to_string(),
                stats: PatternStats::Event(stats),
            };
        };

        handle.abort();
        let _ = handle.await;

        let removed = self.emitter.remove_channel(Self::CHANNEL).await;

        info!(removed_listeners = removed, "event leak stopped");

        let stats = self.stats_for(&state).await;
        LeakReport {
            message: format!("Event leak stopped; removed {removed} listener(s)"),
            stats: PatternStats::Event(stats),
        }
    }

    /// Fire every accumulated listener. Accumulation is untouched; the
    /// same listeners will all fire again next time.
    pub async fn trigger(&self) -> LeakReport {
        let fired_now = self.emitter.emit(Self::CHANNEL).await;
        let state = self.state.lock().await;
        let stats = self.stats_for(&state).await;
        LeakReport {
            message: format!("Fired {fired_now} listener(s)"),
            stats: PatternStats::Event(stats),
        }
    }

    /// Report current state without touching it.
    pub async fn status(&self) -> LeakReport {
        let state = self.state.lock().await;
        let stats = self.stats_for(&state).await;
        let message = if stats.is_leaking {
            "Event leak is running"
        } else {
            "Event leak is idle"
        };
        LeakReport {
            message: message.to_string(),
            stats: PatternStats::Event(stats),
        }
    }

    async fn stats_for(&self, state: &EventState) -> EventStats {
        let listeners = self.emitter.listener_count(Self::CHANNEL).await;
        EventStats {
            listeners,
            events_fired: self.fired.load(Ordering::Relaxed),
            estimated_bytes: (listeners as u64).saturating_mul(self.config.payload_bytes as u64),
            is_leaking: state.task.is_some(),
            started_at: state.started_at,
        }
    }
}
