//! Readiness check: GET /health/ready

use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health/ready", get(ready))
}

/// GET /health/ready - Plain-text readiness
///
/// Reports `ok` normally and `draining` with a 503 while a capture holds
/// the gate, so load balancers steer traffic away for the duration.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.readiness.is_ready() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "draining")
    }
}
