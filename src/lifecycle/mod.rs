//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → flag set + broadcast
//!     → each loop finishes its in-flight iteration
//!     → loops exit, push channel closed
//! ```
//!
//! # Design Decisions
//! - Cooperative: loops check the flag between iterations
//! - Sleeps race the broadcast so shutdown never waits a full interval

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownListener};
