//! Unix signal plumbing: SIGUSR2 captures one snapshot per delivery.

use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info, warn};

use crate::state::AppState;

/// Filename label for signal-triggered snapshots.
const SIGNAL_LABEL: &str = "signal";

/// Arm a background task that captures one snapshot per SIGUSR2.
///
/// Captures go through the same single-flight gate as the HTTP surface;
/// a signal arriving while a capture is in flight is logged and dropped,
/// never queued.
pub fn spawn_sigusr2_listener(state: &AppState) {
    let state = state.clone();
    tokio::spawn(async move {
        let mut deliveries = match signal(SignalKind::user_defined2()) {
            Ok(stream) => stream,
            Err(err) => {
                error!(error = %err, "failed to install SIGUSR2 handler");
                return;
            }
        };
        info!("SIGUSR2 snapshot trigger armed");

        while deliveries.recv().await.is_some() {
            let Some(guard) = state.capture_gate.try_begin() else {
                warn!("SIGUSR2 ignored, a capture is already in progress");
                continue;
            };
            match state.snapshots.write_snapshot(SIGNAL_LABEL).await {
                Ok(artifact) => {
                    info!(filename = %artifact.filename, "signal-triggered snapshot captured");
                }
                Err(err) => {
                    error!(error = %err, "signal-triggered snapshot failed");
                }
            }
            drop(guard);
        }
    });
}
