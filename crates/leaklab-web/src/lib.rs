//! HTTP surface for leaklab.
//!
//! Thin handlers over `leaklab-engine`: pattern control under
//! `/memory-leak`, the token-gated heap dump under `/internal/debug`,
//! and the readiness check the capture gate drains.

pub mod config;
pub mod error;
pub mod routes;
pub mod server;
#[cfg(unix)]
pub mod signal;
pub mod state;

pub use config::ServerArgs;
pub use error::{AppError, ErrorResponse};
pub use server::{create_app, run};
pub use state::AppState;
