//! Shared primitives for leaklab.
//!
//! Home of the pieces every other crate leans on: the process-wide
//! readiness flag, the constant-time admin gate, and the procfs-backed
//! memory counters.

pub mod counters;
pub mod error;
pub mod gate;
pub mod readiness;

pub use counters::MemoryCounters;
pub use error::{Error, Result};
pub use gate::AdminGate;
pub use readiness::Readiness;
