//! Process-wide readiness flag.

use std::sync::atomic::{AtomicBool, Ordering};

/// Ready/not-ready flag consumed by the health endpoint.
///
/// Ready by default. Captures drain readiness around expensive work, and
/// the flag is observed from whichever runtime worker thread serves the
/// health check, so loads are Acquire and stores are Release rather than
/// relying on any cooperative-scheduling guarantee.
#[derive(Debug)]
pub struct Readiness {
    ready: AtomicBool,
}

impl Readiness {
    /// Create a flag in the ready state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ready: AtomicBool::new(true),
        }
    }

    /// Whether the process currently reports ready.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Flip the flag.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}
