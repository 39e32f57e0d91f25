//! Leak-pattern generators and the heap snapshot service.
//!
//! The engine is the teaching core of leaklab: five generators that each
//! reproduce one classic memory-leak shape on demand, plus a snapshot
//! service that captures process-memory artifacts for before/after
//! comparison. Everything here is runtime-agnostic apart from Tokio; the
//! HTTP surface lives in `leaklab-web`.

pub mod error;
pub mod leaks;
pub mod snapshot;

pub use error::{Error, Result};
pub use leaks::{
    LeakEngine, LeakEngineBuilder, LeakReport, PatternKind, PatternStats, UnknownPattern,
};
pub use snapshot::{
    AutoSnapshotController, CaptureGate, CaptureGuard, HeapDump, ProcessHeapDump, SeriesOptions,
    SnapshotArtifact, SnapshotSeries, SnapshotService,
};
