//! Request line parsing.
//!
//! # Responsibilities
//! - Split `METHOD SP target SP version` into its parts
//! - Decide whether the method is one the proxy forwards
//!
//! # Design Decisions
//! - Tokens are whitespace separated; extra tokens are ignored
//! - Method matching is ASCII case-insensitive

use crate::error::ProxyError;
use crate::http::line::trim_line_end;

/// Methods the proxy forwards to an origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
}

impl Method {
    /// Canonical upper-case token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
        }
    }
}

impl std::str::FromStr for Method {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("GET") {
            Ok(Method::Get)
        } else if s.eq_ignore_ascii_case("HEAD") {
            Ok(Method::Head)
        } else {
            Err(ProxyError::UnsupportedMethod(s.to_string()))
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three parts of a request line, method not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub target: String,
    pub version: String,
}

impl RequestLine {
    /// Parse a raw request line (terminator optional).
    pub fn parse(line: &[u8]) -> Result<Self, ProxyError> {
        let text = String::from_utf8_lossy(trim_line_end(line));
        let mut tokens = text.split_whitespace();
        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(method), Some(target), Some(version)) => Ok(Self {
                method: method.to_string(),
                target: target.to_string(),
                version: version.to_string(),
            }),
            _ => Err(ProxyError::MalformedRequestLine(text.into_owned())),
        }
    }

    /// Validate the method against the forwardable set.
    pub fn method(&self) -> Result<Method, ProxyError> {
        self.method.parse()
    }
}
