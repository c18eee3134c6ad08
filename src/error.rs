//! Per-connection error taxonomy.
//!
//! # Design Decisions
//! - Every failure is terminal for its connection only, never for the acceptor
//! - Failures detected before the relay starts map to an error response
//! - Relay-phase failures are logged and the connection is closed

use crate::http::error::Status;

/// Errors raised while handling one client connection.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Socket-level failure before the relay started.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A request line or header line exceeded the configured limit.
    #[error("{kind} exceeds {limit} bytes")]
    LineTooLong { kind: LineKind, limit: usize },

    /// Too many header lines, or too many header bytes in total.
    #[error("request headers exceed configured limits")]
    HeadersTooLarge,

    /// The request line did not contain method, target and version.
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),

    /// Anything other than GET or HEAD.
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    /// DNS resolution or TCP connect to the origin failed.
    #[error("connect failed to {host}:{port}: {source}")]
    ConnectFailed {
        host: String,
        port: String,
        #[source]
        source: std::io::Error,
    },

    /// The origin response could not be relayed completely.
    #[error("relay failed: {0}")]
    Relay(#[from] RelayError),
}

/// Which kind of line overflowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    RequestLine,
    HeaderLine,
}

impl std::fmt::Display for LineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineKind::RequestLine => write!(f, "request line"),
            LineKind::HeaderLine => write!(f, "header line"),
        }
    }
}

/// Errors from the response relay. Never surfaced to the client.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("I/O error during relay: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response details for a failure the client should hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientReport {
    pub status: Status,
    pub cause: String,
    pub long_message: &'static str,
}

impl ProxyError {
    /// Map this failure to the error response sent to the client, if any.
    ///
    /// Returns `None` when the client is gone or the relay has already started
    /// writing the origin's response.
    pub fn client_report(&self) -> Option<ClientReport> {
        let report = match self {
            ProxyError::UnsupportedMethod(method) => ClientReport {
                status: Status::NOT_IMPLEMENTED,
                cause: method.clone(),
                long_message: "Proxy does not implement this method",
            },
            ProxyError::ConnectFailed { host, .. } => ClientReport {
                status: Status::NOT_FOUND,
                cause: host.clone(),
                long_message: "Proxy couldn't connect to the server",
            },
            ProxyError::MalformedRequestLine(line) => ClientReport {
                status: Status::BAD_REQUEST,
                cause: line.clone(),
                long_message: "Proxy could not parse the request line",
            },
            ProxyError::LineTooLong {
                kind: LineKind::RequestLine,
                limit,
            } => ClientReport {
                status: Status::URI_TOO_LONG,
                cause: format!("{limit} bytes"),
                long_message: "Request line is longer than the proxy accepts",
            },
            ProxyError::LineTooLong {
                kind: LineKind::HeaderLine,
                ..
            }
            | ProxyError::HeadersTooLarge => ClientReport {
                status: Status::HEADER_FIELDS_TOO_LARGE,
                cause: "request headers".to_string(),
                long_message: "Request headers are larger than the proxy accepts",
            },
            ProxyError::Io(_) | ProxyError::Relay(_) => return None,
        };
        Some(report)
    }

    /// Short label used for the `outcome` metric dimension.
    pub fn outcome(&self) -> &'static str {
        match self {
            ProxyError::UnsupportedMethod(_)
            | ProxyError::MalformedRequestLine(_)
            | ProxyError::LineTooLong { .. }
            | ProxyError::HeadersTooLarge => "rejected",
            ProxyError::ConnectFailed { .. } => "origin_unreachable",
            ProxyError::Io(_) | ProxyError::Relay(_) => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_method_maps_to_501() {
        let report = ProxyError::UnsupportedMethod("POST".into())
            .client_report()
            .unwrap();
        assert_eq!(report.status.code, 501);
        assert_eq!(report.cause, "POST");
    }

    #[test]
    fn connect_failure_names_the_host() {
        let err = ProxyError::ConnectFailed {
            host: "unreachable.invalid".into(),
            port: "80".into(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        let report = err.client_report().unwrap();
        assert_eq!(report.status.code, 404);
        assert_eq!(report.cause, "unreachable.invalid");
        assert_eq!(err.outcome(), "origin_unreachable");
    }

    #[test]
    fn overlong_lines_map_by_kind() {
        let request = ProxyError::LineTooLong {
            kind: LineKind::RequestLine,
            limit: 16,
        };
        let header = ProxyError::LineTooLong {
            kind: LineKind::HeaderLine,
            limit: 16,
        };
        assert_eq!(request.client_report().unwrap().status.code, 414);
        assert_eq!(header.client_report().unwrap().status.code, 431);
        assert_eq!(
            ProxyError::HeadersTooLarge.client_report().unwrap().status.code,
            431
        );
    }

    #[test]
    fn relay_errors_are_not_reported_to_client() {
        let reset = std::io::Error::from(std::io::ErrorKind::ConnectionReset);
        let err = ProxyError::Relay(RelayError::Io(reset));
        assert!(err.client_report().is_none());
        assert_eq!(err.outcome(), "failed");
    }
}
