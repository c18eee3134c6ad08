//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → accept loop stops → in-flight connections drain → exit
//! ```
//!
//! # Design Decisions
//! - Shutdown has timeout: remaining connections are aborted after the grace period

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
