//! The five leak-pattern generators and their shared collaborators.

pub mod cache;
pub mod closure;
pub mod emitter;
pub mod event;
pub mod global;
pub mod timer;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

pub use cache::{CacheLeak, CacheLeakConfig, CacheStats};
pub use closure::{ClosureLeak, ClosureLeakConfig, ClosureStats};
pub use emitter::{Emitter, Handler};
pub use event::{EventLeak, EventLeakConfig, EventStats};
pub use global::{GlobalLeak, GlobalLeakConfig, GlobalStats, GlobalStore};
pub use timer::{TimerLeak, TimerLeakConfig, TimerStats};

/// The five leak patterns, named as they appear in request paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    Timer,
    Cache,
    Closure,
    Event,
    GlobalVariable,
}

impl PatternKind {
    /// Every pattern, in a fixed display order.
    pub const ALL: [Self; 5] = [
        Self::Timer,
        Self::Cache,
        Self::Closure,
        Self::Event,
        Self::GlobalVariable,
    ];

    /// The path segment naming this pattern.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timer => "timer",
            Self::Cache => "cache",
            Self::Closure => "closure",
            Self::Event => "event",
            Self::GlobalVariable => "global-variable",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for pattern names no generator answers to.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown leak pattern: {0}")]
pub struct UnknownPattern(pub String);

impl FromStr for PatternKind {
    type Err = UnknownPattern;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timer" => Ok(Self::Timer),
            "cache" => Ok(Self::Cache),
            "closure" => Ok(Self::Closure),
            "event" => Ok(Self::Event),
            "global-variable" => Ok(Self::GlobalVariable),
            other => Err(UnknownPattern(other.to_string())),
        }
    }
}

/// Stats payload carried by a [`LeakReport`], one shape per pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PatternStats {
    Timer(TimerStats),
    Cache(CacheStats),
    Closure(ClosureStats),
    Event(EventStats),
    Global(GlobalStats),
}

/// Outcome of a generator operation: one human-readable sentence plus the
/// quantitative state after the operation took effect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeakReport {
    /// What happened.
    pub message: String,
    /// Generator state after the operation.
    pub stats: PatternStats,
}

/// Allocate one accumulation chunk.
///
/// Chunks are filled with a marker byte rather than zeroes: zero-filled
/// allocations can stay lazily mapped and would never move the
/// resident-set counters this tool exists to demonstrate.
#[must_use]
pub(crate) fn leak_chunk(bytes: usize) -> Vec<u8> {
    vec![0xA5; bytes]
}

/// Facade over the five generators, dispatching by [`PatternKind`].
///
/// Built once at the application root and shared; the generators inside
/// are the process-wide singletons the whole tool observes.
pub struct LeakEngine {
    timer: TimerLeak,
    cache: CacheLeak,
    closure: ClosureLeak,
    event: EventLeak,
    global: GlobalLeak,
}

impl LeakEngine {
    /// Create an engine with production default configs.
    #[must_use]
    pub fn new(store: Arc<GlobalStore>, emitter: Arc<Emitter>) -> Self {
        Self::builder().build(store, emitter)
    }

    /// Start building an engine with custom generator configs.
    #[must_use]
    pub fn builder() -> LeakEngineBuilder {
        LeakEngineBuilder::new()
    }

    /// Start accumulation for one pattern.
    pub async fn start(&self, kind: PatternKind) -> LeakReport {
        match kind {
            PatternKind::Timer => self.timer.start().await,
            PatternKind::Cache => self.cache.start().await,
            PatternKind::Closure => self.closure.start().await,
            PatternKind::Event => self.event.start().await,
            PatternKind::GlobalVariable => self.global.start().await,
        }
    }

    /// Stop accumulation for one pattern.
    pub async fn stop(&self, kind: PatternKind) -> LeakReport {
        match kind {
            PatternKind::Timer => self.timer.stop().await,
            PatternKind::Cache => self.cache.stop().await,
            PatternKind::Closure => self.closure.stop().await,
            PatternKind::Event => self.event.stop().await,
            PatternKind::GlobalVariable => self.global.stop().await,
        }
    }

    /// Report one pattern's state without touching it.
    pub async fn status(&self, kind: PatternKind) -> LeakReport {
        match kind {
            PatternKind::Timer => self.timer.status().await,
            PatternKind::Cache => self.cache.status().await,
            PatternKind::Closure => self.closure.status().await,
            PatternKind::Event => self.event.status().await,
            PatternKind::GlobalVariable => self.global.status().await,
        }
    }

    /// Fire the Event pattern's accumulated listeners.
    pub async fn trigger_event(&self) -> LeakReport {
        self.event.trigger().await
    }

    /// Status for every pattern, in [`PatternKind::ALL`] order.
    pub async fn status_all(&self) -> Vec<(PatternKind, LeakReport)> {
        let mut reports = Vec::with_capacity(PatternKind::ALL.len());
        for kind in PatternKind::ALL {
            reports.push((kind, self.status(kind).await));
        }
        reports
    }
}

/// Builder for [`LeakEngine`], used by tests to shrink chunk sizes and
/// intervals to something a test runner can afford.
pub struct LeakEngineBuilder {
    timer: TimerLeakConfig,
    cache: CacheLeakConfig,
    closure: ClosureLeakConfig,
    event: EventLeakConfig,
    global: GlobalLeakConfig,
}

impl LeakEngineBuilder {
    fn new() -> Self {
        Self {
            timer: TimerLeakConfig::default(),
            cache: CacheLeakConfig::default(),
            closure: ClosureLeakConfig::default(),
            event: EventLeakConfig::default(),
            global: GlobalLeakConfig::default(),
        }
    }

    #[must_use]
    pub fn timer_config(mut self, config: TimerLeakConfig) -> Self {
        self.timer = config;
        self
    }

    #[must_use]
    pub fn cache_config(mut self, config: CacheLeakConfig) -> Self {
        self.cache = config;
        self
    }

    #[must_use]
    pub fn closure_config(mut self, config: ClosureLeakConfig) -> Self {
        self.closure = config;
        self
    }

    #[must_use]
    pub fn event_config(mut self, config: EventLeakConfig) -> Self {
        self.event = config;
        self
    }

    #[must_use]
    pub fn global_config(mut self, config: GlobalLeakConfig) -> Self {
        self.global = config;
        self
    }

    /// Assemble the engine around the shared store and emitter.
    #[must_use]
    pub fn build(self, store: Arc<GlobalStore>, emitter: Arc<Emitter>) -> LeakEngine {
        LeakEngine {
            timer: TimerLeak::new(self.timer),
            cache: CacheLeak::new(self.cache),
            closure: ClosureLeak::new(self.closure),
            event: EventLeak::new(self.event, emitter),
            global: GlobalLeak::new(self.global, store),
        }
    }
}
