//! Single-flight capture gate with a scoped readiness drain.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use leaklab_core::Readiness;

/// Admits at most one on-demand capture at a time.
///
/// Acquisition drains the readiness flag so load balancers route around
/// the process while it is busy; the returned guard restores readiness
/// and releases the gate on drop, whichever way the capture exits.
#[derive(Clone)]
pub struct CaptureGate {
    in_progress: Arc<AtomicBool>,
    readiness: Arc<Readiness>,
}

impl CaptureGate {
    /// Create a gate draining the given readiness flag.
    #[must_use]
    pub fn new(readiness: Arc<Readiness>) -> Self {
        Self {
            in_progress: Arc::new(AtomicBool::new(false)),
            readiness,
        }
    }

    /// Try to begin a capture.
    ///
    /// Returns `None` when a capture is already in flight. Callers reject
    /// on `None`; requests are never queued behind a running capture.
    #[must_use]
    pub fn try_begin(&self) -> Option<CaptureGuard> {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }
        self.readiness.set_ready(false);
        debug!("capture gate acquired, readiness drained");
        Some(CaptureGuard {
            in_progress: Arc::clone(&self.in_progress),
            readiness: Arc::clone(&self.readiness),
        })
    }

    /// Whether a capture currently holds the gate.
    #[must_use]
    pub fn in_progress(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }
}

/// Restores readiness and releases the gate when dropped.
pub struct CaptureGuard {
    in_progress: Arc<AtomicBool>,
    readiness: Arc<Readiness>,
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        // Readiness comes back before the gate opens so a waiting caller
        // never observes ready=false after winning the gate themselves.
        self.readiness.set_ready(true);
        self.in_progress.store(false, Ordering::Release);
        debug!("capture gate released, readiness restored");
    }
}
