//! Forward proxy pipeline.
//!
//! # Data Flow
//! ```text
//! server.rs (accept, spawn one task per connection)
//!     → handler.rs (request line, method check, target, headers)
//!     → connector.rs (dial origin host:port)
//!     → forwarder.rs (HTTP/1.0 request with canonical headers)
//!     → relay.rs (origin response → client: headers, then raw bytes)
//! ```

pub mod connector;
pub mod forwarder;
pub mod handler;
pub mod relay;
pub mod server;

pub use connector::{OriginConnector, TcpConnector};
pub use forwarder::RequestForwarder;
pub use handler::{ConnectionHandler, Exchange};
pub use relay::{RelayPhase, RelayStats, ResponseRelay};
pub use server::ProxyServer;
