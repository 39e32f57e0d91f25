//! Token-gated on-demand heap dump endpoint.

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::post,
};
use serde::Serialize;
use tracing::{error, info};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Header carrying the admin secret.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Filename label for dumps requested over HTTP.
const DUMP_LABEL: &str = "manual";

pub fn router() -> Router<AppState> {
    Router::new().route("/internal/debug/heapdump", post(trigger_heapdump))
}

#[derive(Debug, Serialize)]
pub struct DumpStarted {
    message: &'static str,
}

/// POST /internal/debug/heapdump - Kick off one background capture
///
/// The 202 only confirms the capture started. At most one dump runs at a
/// time; readiness stays drained until the background task finishes and
/// its guard drops.
pub async fn trigger_heapdump(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<DumpStarted>)> {
    // Disabled endpoint and bad token produce the same denial.
    if !state.heapdump_enabled {
        return Err(AppError::Forbidden);
    }

    let presented = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());
    if !state.admin_gate.verify(presented) {
        return Err(AppError::Forbidden);
    }

    let Some(guard) = state.capture_gate.try_begin() else {
        return Err(AppError::DumpInProgress);
    };

    info!("heap dump requested, capture starting");
    let snapshots = state.snapshots.clone();
    tokio::spawn(async move {
        let _guard = guard;
        match snapshots.write_snapshot(DUMP_LABEL).await {
            Ok(artifact) => {
                info!(filename = %artifact.filename, "heap dump captured");
            }
            Err(err) => {
                error!(error = %err, "heap dump failed");
            }
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(DumpStarted {
            message: "dump started",
        }),
    ))
}
