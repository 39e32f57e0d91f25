//! leaklab server binary.
//!
//! Wires the process-wide singletons, then serves until interrupted.

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leaklab_engine::SnapshotService;
use leaklab_engine::leaks::{Emitter, GlobalStore, LeakEngine};
use leaklab_web::{AppState, ServerArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,leaklab_web=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = ServerArgs::parse();
    info!(
        listen = %args.listen,
        snapshot_dir = %args.snapshot_dir.display(),
        heapdump_enabled = args.heapdump_enabled,
        "starting leaklab"
    );

    let engine = LeakEngine::new(Arc::new(GlobalStore::new()), Arc::new(Emitter::new()));
    let snapshots = SnapshotService::new(args.snapshot_dir.clone());
    let state = AppState::new(engine, snapshots, args.admin_token.clone(), args.heapdump_enabled);

    leaklab_web::run(args.listen, state).await
}
