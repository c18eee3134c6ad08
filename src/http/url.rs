//! Request-target decomposition.
//!
//! # Rules
//! - `http://` is stripped; `https://` is stripped and switches the default port to 443
//! - The first `/` starts the path; without one the path is `/`
//! - A `:` in the authority splits host from an explicit port, which wins over the default
//!
//! No percent-decoding and no host or port validation: malformed input yields a
//! best-effort split.

const HTTP_PREFIX: &str = "http://";
const HTTPS_PREFIX: &str = "https://";

pub const DEFAULT_HTTP_PORT: &str = "80";
pub const DEFAULT_HTTPS_PORT: &str = "443";

/// Origin host, port and path extracted from a request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Host without any port suffix.
    pub host: String,
    /// Port as written, or the scheme default.
    pub port: String,
    /// Always starts with `/`.
    pub path: String,
}

impl Target {
    /// Split a raw request target into host, port and path.
    pub fn parse(raw: &str) -> Self {
        let (rest, default_port) = if let Some(rest) = raw.strip_prefix(HTTP_PREFIX) {
            (rest, DEFAULT_HTTP_PORT)
        } else if let Some(rest) = raw.strip_prefix(HTTPS_PREFIX) {
            (rest, DEFAULT_HTTPS_PORT)
        } else {
            (raw, DEFAULT_HTTP_PORT)
        };

        let (authority, path) = match rest.find('/') {
            Some(idx) => rest.split_at(idx),
            None => (rest, "/"),
        };

        let (host, port) = match authority.split_once(':') {
            Some((host, port)) => (host, port),
            None => (authority, default_port),
        };

        Self {
            host: host.to_string(),
            port: port.to_string(),
            path: path.to_string(),
        }
    }

    /// `host:port` form for dialing and logging.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}{}", self.host, self.port, self.path)
    }
}
