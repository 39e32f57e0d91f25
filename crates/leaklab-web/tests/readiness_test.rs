//! Readiness endpoint tests
//!
//! GET /health/ready is plain text and mirrors the capture gate.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Tests are allowed to unwrap

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use leaklab_engine::SnapshotService;
use leaklab_engine::leaks::{Emitter, GlobalStore, LeakEngine};
use leaklab_web::{AppState, create_app};

fn test_state() -> (AppState, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let engine = LeakEngine::new(Arc::new(GlobalStore::new()), Arc::new(Emitter::new()));
    let state = AppState::new(engine, SnapshotService::new(dir.path()), None, true);
    (state, dir)
}

async fn check_ready(app: &Router) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health/ready")
                .body(Body::empty())
                .expect("Failed to build request"),
        )
        .await
        .expect("Request failed");

    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect body")
        .to_bytes();

    (status, String::from_utf8_lossy(&bytes).into_owned())
}

#[tokio::test]
async fn test_ready_by_default() {
    let (state, _dir) = test_state();
    let app = create_app(state);

    let (status, body) = check_ready(&app).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_draining_while_the_gate_is_held() {
    // Given: an app whose capture gate we hold directly
    let (state, _dir) = test_state();
    let app = create_app(state.clone());

    let guard = state.capture_gate.try_begin().expect("gate should be free");

    // When/Then: readiness drains for exactly the guard's lifetime
    let (status, body) = check_ready(&app).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, "draining");

    drop(guard);

    let (status, body) = check_ready(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}
