//! REST API routes
//!
//! ## Route Structure
//!
//! - `POST /memory-leak/{pattern}/start` - Start one leak pattern
//! - `POST /memory-leak/{pattern}/stop` - Stop it and report what was freed
//! - `GET /memory-leak/{pattern}/status` - One pattern's current stats
//! - `POST /memory-leak/event/trigger` - Fire the Event pattern's listeners
//! - `GET /memory-leak/status` - All five patterns plus process memory
//! - `POST /internal/debug/heapdump` - Token-gated on-demand heap dump
//! - `GET /health/ready` - Readiness check, drains during captures

use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod heapdump;
pub mod leaks;

/// Assemble every route group into a single router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(leaks::router())
        .merge(heapdump::router())
        .merge(health::router())
}
