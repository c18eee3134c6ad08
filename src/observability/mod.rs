//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Acceptor and connection tasks produce:
//!     → logging.rs (structured events, one span per connection)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
