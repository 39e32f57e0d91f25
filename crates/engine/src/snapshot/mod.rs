//! Heap snapshot capture: backends, orchestration, and the single-flight
//! gate that drains readiness while a capture runs.

pub mod dump;
pub mod guard;
pub mod service;

pub use dump::{HeapDocument, HeapDump, ProcessHeapDump};
pub use guard::{CaptureGate, CaptureGuard};
pub use service::{
    AutoSnapshotController, SeriesOptions, SnapshotArtifact, SnapshotSeries, SnapshotService,
};
