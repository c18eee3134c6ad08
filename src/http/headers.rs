//! Request header filtering.
//!
//! # Responsibilities
//! - Read client header lines up to the blank line
//! - Drop hop-by-hop headers the proxy supplies itself
//! - Keep every other header, in the client's order
//!
//! # Design Decisions
//! - Name comparison is ASCII case-insensitive
//! - Lines without `:` are skipped, not fatal
//! - Line length, header count and total size are bounded

use tokio::io::AsyncBufRead;

use crate::config::LimitsConfig;
use crate::error::{LineKind, ProxyError};
use crate::http::line::{self, ReadLine};

/// Headers the proxy never forwards from the client. The forwarder writes its
/// own canonical values for them.
pub const HOP_BY_HOP: [&str; 4] = ["Host", "User-Agent", "Connection", "Proxy-Connection"];

/// Returns true if `name` is one of [`HOP_BY_HOP`].
pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// A single forwarded header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Ordered set of headers that survive filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBlock {
    headers: Vec<Header>,
}

impl HeaderBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer one raw header line. Returns true if it was kept.
    pub fn push_line(&mut self, raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(line::trim_line_end(raw));
        let Some((name, value)) = text.split_once(':') else {
            tracing::trace!(line = %text, "Skipping header line without colon");
            return false;
        };
        if is_hop_by_hop(name) {
            return false;
        }
        self.headers.push(Header {
            name: name.to_string(),
            value: value.trim_start_matches(' ').to_string(),
        });
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.headers.iter()
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Append `Name: Value\r\n` per header and the terminating blank line.
    pub fn write_to(&self, out: &mut String) {
        for header in &self.headers {
            out.push_str(&header.name);
            out.push_str(": ");
            out.push_str(&header.value);
            out.push_str("\r\n");
        }
        out.push_str("\r\n");
    }
}

/// Read header lines until a blank line (or end of stream) and filter them.
pub async fn read_headers<R>(reader: &mut R, limits: &LimitsConfig) -> Result<HeaderBlock, ProxyError>
where
    R: AsyncBufRead + Unpin,
{
    let mut block = HeaderBlock::new();
    let mut buf = Vec::with_capacity(256);
    let mut lines = 0usize;
    let mut total = 0usize;

    loop {
        match line::read_line(reader, &mut buf, limits.max_line_bytes).await? {
            ReadLine::Eof => break,
            ReadLine::TooLong => {
                return Err(ProxyError::LineTooLong {
                    kind: LineKind::HeaderLine,
                    limit: limits.max_line_bytes,
                })
            }
            ReadLine::Line if line::is_blank(&buf) => break,
            ReadLine::Line => {
                lines += 1;
                total += buf.len();
                if lines > limits.max_header_count || total > limits.max_header_bytes {
                    return Err(ProxyError::HeadersTooLarge);
                }
                block.push_line(&buf);
            }
        }
    }

    Ok(block)
}
