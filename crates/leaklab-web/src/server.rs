//! Server assembly with Tower middleware and graceful shutdown.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::routes;
use crate::state::AppState;

/// Create the axum application with middleware.
#[must_use]
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C or SIGTERM.
///
/// Creates the snapshot directory and, on Unix with heap dumps enabled,
/// arms the SIGUSR2 trigger before accepting traffic.
///
/// # Errors
///
/// Returns an error when the snapshot directory cannot be created or the
/// listener fails to bind or serve.
pub async fn run(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    state.snapshots.ensure_dir().await?;

    #[cfg(unix)]
    if state.heapdump_enabled {
        crate::signal::spawn_sigusr2_listener(&state);
    }

    let app = create_app(state);
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "leaklab listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Resolve when the process is asked to shut down.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(stream) => stream,
                Err(err) => {
                    warn!(error = %err, "SIGTERM handler unavailable, ctrl-c only");
                    let _ = ctrl_c.await;
                    return;
                }
            };

        tokio::select! {
            _ = ctrl_c => info!("ctrl-c received, shutting down"),
            _ = sigterm.recv() => info!("SIGTERM received, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        info!("ctrl-c received, shutting down");
    }
}
