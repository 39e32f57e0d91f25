//! Runtime configuration from CLI flags with environment fallbacks.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Spin up deliberate memory leaks and watch them grow.
#[derive(Debug, Clone, Parser)]
#[command(name = "leaklab", version, about)]
pub struct ServerArgs {
    /// Address to listen on.
    #[arg(long, env = "LEAKLAB_LISTEN", default_value = "127.0.0.1:3000")]
    pub listen: SocketAddr,

    /// Directory heap snapshot artifacts are written to.
    #[arg(long, env = "LEAKLAB_SNAPSHOT_DIR", default_value = "./snapshots")]
    pub snapshot_dir: PathBuf,

    /// Shared secret for the debug heap dump endpoint. When unset the
    /// gate denies every request.
    #[arg(long, env = "LEAKLAB_ADMIN_TOKEN")]
    pub admin_token: Option<String>,

    /// Serve the debug heap dump endpoint and the SIGUSR2 trigger.
    #[arg(
        long,
        env = "LEAKLAB_HEAPDUMP_ENABLED",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub heapdump_enabled: bool,
}
