//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (connection ID, live count)
//!     → Hand off to the proxy handler
//! ```
//!
//! # Design Decisions
//! - Bounded concurrency prevents resource exhaustion
//! - Each connection tracked for shutdown logging

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{ConnectionPermit, Listener, ListenerError};
