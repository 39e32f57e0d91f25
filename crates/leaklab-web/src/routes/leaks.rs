//! Leak-pattern control endpoints.

use std::collections::BTreeMap;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use leaklab_core::MemoryCounters;
use leaklab_engine::{LeakReport, PatternKind};

use crate::error::Result;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/memory-leak/{pattern}/start", post(start_pattern))
        .route("/memory-leak/{pattern}/stop", post(stop_pattern))
        .route("/memory-leak/{pattern}/status", get(pattern_status))
        .route("/memory-leak/event/trigger", post(trigger_event))
        .route("/memory-leak/status", get(aggregate_status))
}

/// Combined view over every generator plus raw process memory.
#[derive(Debug, Serialize)]
pub struct AggregateStatus {
    timestamp: DateTime<Utc>,
    patterns: BTreeMap<String, LeakReport>,
    /// Null on platforms without a readable procfs.
    memory: Option<MemoryCounters>,
}

/// POST /memory-leak/{pattern}/start - Begin accumulation
pub async fn start_pattern(
    State(state): State<AppState>,
    Path(pattern): Path<String>,
) -> Result<(StatusCode, Json<LeakReport>)> {
    let kind: PatternKind = pattern.parse()?;
    info!(pattern = %kind, "leak start requested");
    let report = state.engine.start(kind).await;
    Ok((StatusCode::CREATED, Json(report)))
}

/// POST /memory-leak/{pattern}/stop - End accumulation
pub async fn stop_pattern(
    State(state): State<AppState>,
    Path(pattern): Path<String>,
) -> Result<(StatusCode, Json<LeakReport>)> {
    let kind: PatternKind = pattern.parse()?;
    info!(pattern = %kind, "leak stop requested");
    let report = state.engine.stop(kind).await;
    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /memory-leak/{pattern}/status - One pattern's current stats
pub async fn pattern_status(
    State(state): State<AppState>,
    Path(pattern): Path<String>,
) -> Result<Json<LeakReport>> {
    let kind: PatternKind = pattern.parse()?;
    Ok(Json(state.engine.status(kind).await))
}

/// POST /memory-leak/event/trigger - Fire the Event pattern's listeners
pub async fn trigger_event(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<LeakReport>)> {
    let report = state.engine.trigger_event().await;
    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /memory-leak/status - All five patterns plus process memory
pub async fn aggregate_status(State(state): State<AppState>) -> Json<AggregateStatus> {
    let mut patterns = BTreeMap::new();
    for (kind, report) in state.engine.status_all().await {
        patterns.insert(kind.to_string(), report);
    }

    let memory = match MemoryCounters::read_self() {
        Ok(counters) => Some(counters),
        Err(error) => {
            warn!(error = %error, "process memory counters unavailable");
            None
        }
    };

    Json(AggregateStatus {
        timestamp: Utc::now(),
        patterns,
        memory,
    })
}
