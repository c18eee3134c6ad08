//! HTTP/1.0 message handling for the proxy.
//!
//! # Data Flow
//! ```text
//! client bytes
//!     → line.rs (length-checked line reads)
//!     → request.rs (method, target, version)
//!     → url.rs (origin host, port, path)
//!     → headers.rs (hop-by-hop filtering)
//!     → proxy layer (forward + relay)
//!
//! on failure before the relay:
//!     → error.rs (HTML error response)
//! ```

pub mod error;
pub mod headers;
pub mod line;
pub mod request;
pub mod url;

pub use error::Status;
pub use headers::{HeaderBlock, HOP_BY_HOP};
pub use request::{Method, RequestLine};
pub use url::Target;
