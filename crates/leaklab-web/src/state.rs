//! Shared application state: the singletons every handler borrows.

use std::sync::Arc;

use leaklab_core::{AdminGate, Readiness};
use leaklab_engine::leaks::LeakEngine;
use leaklab_engine::{CaptureGate, SnapshotService};

/// Everything the handlers share, built once at the composition root.
///
/// Cloning is cheap; all fields are handles onto the same underlying
/// singletons, so a status read and a capture in different tasks observe
/// one world.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<LeakEngine>,
    pub snapshots: SnapshotService,
    pub readiness: Arc<Readiness>,
    pub capture_gate: CaptureGate,
    pub admin_gate: Arc<AdminGate>,
    pub heapdump_enabled: bool,
}

impl AppState {
    /// Wire the state from its two injected services. Readiness and the
    /// capture gate are created here so they are guaranteed to be the
    /// same pair the health check and the dump endpoint consult.
    #[must_use]
    pub fn new(
        engine: LeakEngine,
        snapshots: SnapshotService,
        admin_token: Option<String>,
        heapdump_enabled: bool,
    ) -> Self {
        let readiness = Arc::new(Readiness::new());
        Self {
            engine: Arc::new(engine),
            snapshots,
            capture_gate: CaptureGate::new(Arc::clone(&readiness)),
            readiness,
            admin_gate: Arc::new(AdminGate::new(admin_token)),
            heapdump_enabled,
        }
    }
}
