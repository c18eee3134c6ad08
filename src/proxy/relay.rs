//! Origin response relay.
//!
//! # State Transitions
//! ```text
//! Headers → Body: first blank line from the origin (forwarded too)
//! Headers → Done: origin closed before the blank line
//! Body    → Done: origin closed
//! ```
//!
//! Header bytes are forwarded chunk by chunk as they arrive while the relay
//! scans for the blank line, so no origin line is ever too long to pass
//! through. The body is a pure byte pipe with no Content-Length or chunked
//! interpretation: the forwarded request asked for `Connection: close`, so end
//! of body is end of connection.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::RelayError;

/// Where the relay currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayPhase {
    Headers,
    Body,
    Done,
}

/// Byte counts for a finished relay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Status line, header lines and the blank line.
    pub header_bytes: u64,
    pub body_bytes: u64,
    /// False if the origin closed before ending its header block.
    pub headers_complete: bool,
}

impl RelayStats {
    pub fn total(&self) -> u64 {
        self.header_bytes + self.body_bytes
    }
}

/// Finds the end of a header block across arbitrary chunk boundaries.
///
/// A blank line is `\r\n` or a bare `\n`. Only the length of the current
/// line and whether it began with `\r` are kept, so memory stays constant
/// however long a line grows.
#[derive(Debug, Default)]
struct BlankLineScanner {
    line_len: usize,
    starts_with_cr: bool,
}

impl BlankLineScanner {
    /// Returns the offset just past the blank line's `\n`, if `chunk` holds it.
    fn scan(&mut self, chunk: &[u8]) -> Option<usize> {
        for (i, &byte) in chunk.iter().enumerate() {
            if byte == b'\n' {
                if self.line_len == 0 || (self.line_len == 1 && self.starts_with_cr) {
                    return Some(i + 1);
                }
                self.line_len = 0;
                self.starts_with_cr = false;
            } else {
                if self.line_len == 0 {
                    self.starts_with_cr = byte == b'\r';
                }
                self.line_len += 1;
            }
        }
        None
    }
}

/// Two-phase copier from an origin response to the client.
#[derive(Debug)]
pub struct ResponseRelay {
    phase: RelayPhase,
    scanner: BlankLineScanner,
    stats: RelayStats,
}

impl Default for ResponseRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseRelay {
    pub fn new() -> Self {
        Self {
            phase: RelayPhase::Headers,
            scanner: BlankLineScanner::default(),
            stats: RelayStats::default(),
        }
    }

    pub fn phase(&self) -> RelayPhase {
        self.phase
    }

    /// Drive the relay until the origin closes.
    pub async fn run<R, W>(&mut self, origin: &mut R, client: &mut W) -> Result<RelayStats, RelayError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            match self.phase {
                RelayPhase::Headers => self.relay_headers(origin, client).await?,
                RelayPhase::Body => self.relay_body(origin, client).await?,
                RelayPhase::Done => break,
            }
        }
        client.flush().await?;
        Ok(self.stats)
    }

    async fn relay_headers<R, W>(&mut self, origin: &mut R, client: &mut W) -> Result<(), RelayError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            let chunk = origin.fill_buf().await?;
            if chunk.is_empty() {
                tracing::debug!(
                    header_bytes = self.stats.header_bytes,
                    "Origin closed during response headers"
                );
                self.phase = RelayPhase::Done;
                return Ok(());
            }

            let boundary = self.scanner.scan(chunk);
            let take = boundary.unwrap_or(chunk.len());
            client.write_all(&chunk[..take]).await?;
            origin.consume(take);
            self.stats.header_bytes += take as u64;

            if boundary.is_some() {
                self.stats.headers_complete = true;
                self.phase = RelayPhase::Body;
                return Ok(());
            }
        }
    }

    async fn relay_body<R, W>(&mut self, origin: &mut R, client: &mut W) -> Result<(), RelayError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.stats.body_bytes = tokio::io::copy_buf(origin, client).await?;
        self.phase = RelayPhase::Done;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, BufReader};

    async fn relay(input: &[u8]) -> (Result<RelayStats, RelayError>, Vec<u8>, RelayPhase) {
        let mut origin = BufReader::with_capacity(7, input);
        let mut client = Vec::new();
        let mut relay = ResponseRelay::new();
        let result = relay.run(&mut origin, &mut client).await;
        (result, client, relay.phase())
    }

    #[tokio::test]
    async fn forwards_headers_and_body_verbatim() {
        let response = b"HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\n\r\nhello\r\n\r\nworld";
        let (result, client, phase) = relay(response).await;
        let stats = result.unwrap();

        assert_eq!(client, response);
        assert_eq!(phase, RelayPhase::Done);
        assert!(stats.headers_complete);
        assert_eq!(stats.header_bytes, 45);
        assert_eq!(stats.body_bytes, 14);
        assert_eq!(stats.total(), response.len() as u64);
    }

    #[tokio::test]
    async fn binary_body_is_byte_exact() {
        let mut response = b"HTTP/1.1 200 OK\r\nContent-Length: 1024\r\n\r\n".to_vec();
        let body: Vec<u8> = (0..1024u32).map(|i| (i * 31 % 256) as u8).collect();
        response.extend_from_slice(&body);

        let (result, client, _) = relay(&response).await;
        assert_eq!(result.unwrap().body_bytes, body.len() as u64);
        assert_eq!(client, response);
    }

    #[tokio::test]
    async fn body_lines_are_not_length_checked() {
        let mut response = b"HTTP/1.0 200 OK\r\n\r\n".to_vec();
        response.extend(std::iter::repeat(b'x').take(10_000));
        let (result, client, _) = relay(&response).await;
        assert!(result.is_ok());
        assert_eq!(client, response);
    }

    #[tokio::test]
    async fn origin_closing_in_headers_ends_relay() {
        let response = b"HTTP/1.0 200 OK\r\nX-Partial: 1\r\n";
        let (result, client, phase) = relay(response).await;
        let stats = result.unwrap();
        assert!(!stats.headers_complete);
        assert_eq!(stats.body_bytes, 0);
        assert_eq!(client, response);
        assert_eq!(phase, RelayPhase::Done);
    }

    #[tokio::test]
    async fn long_header_line_is_relayed_exactly() {
        let mut response = b"HTTP/1.0 200 OK\r\nSet-Cookie: ".to_vec();
        response.extend(std::iter::repeat(b'a').take(10_000));
        response.extend_from_slice(b"\r\nContent-Length: 2\r\n\r\nok");

        let (result, client, phase) = relay(&response).await;
        let stats = result.unwrap();
        assert_eq!(client, response);
        assert!(stats.headers_complete);
        assert_eq!(stats.body_bytes, 2);
        assert_eq!(phase, RelayPhase::Done);
    }

    #[tokio::test]
    async fn bare_lf_blank_line_ends_headers() {
        let response = b"HTTP/1.0 200 OK\nX-A: 1\n\n\r\nbody";
        let (result, client, _) = relay(response).await;
        let stats = result.unwrap();
        assert_eq!(client, response);
        assert_eq!(stats.header_bytes, 24);
        assert_eq!(stats.body_bytes, 6);
    }

    #[test]
    fn scanner_finds_boundary_split_across_chunks() {
        let mut scanner = BlankLineScanner::default();
        assert_eq!(scanner.scan(b"HTTP/1.0 200 OK\r"), None);
        assert_eq!(scanner.scan(b"\nX: y\r\n\r"), None);
        assert_eq!(scanner.scan(b"\nbody"), Some(1));
    }

    #[test]
    fn scanner_ignores_cr_inside_a_line() {
        let mut scanner = BlankLineScanner::default();
        assert_eq!(scanner.scan(b"X: a\rb\r\n"), None);
        assert_eq!(scanner.scan(b"\r\n"), Some(2));
    }

    #[tokio::test]
    async fn streams_through_duplex_pipes() {
        let (mut origin_tx, origin_rx) = tokio::io::duplex(64);
        let (mut client_tx, mut client_rx) = tokio::io::duplex(64);

        let body: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
        let mut expected = b"HTTP/1.0 200 OK\r\n\r\n".to_vec();
        expected.extend_from_slice(&body);

        let sent = expected.clone();
        let origin_task = tokio::spawn(async move {
            origin_tx.write_all(&sent).await.unwrap();
        });
        let relay_task = tokio::spawn(async move {
            let mut origin = BufReader::new(origin_rx);
            let mut relay = ResponseRelay::new();
            let stats = relay.run(&mut origin, &mut client_tx).await.unwrap();
            drop(client_tx);
            stats
        });

        let mut received = Vec::new();
        client_rx.read_to_end(&mut received).await.unwrap();
        origin_task.await.unwrap();
        let stats = relay_task.await.unwrap();

        assert_eq!(received, expected);
        assert_eq!(stats.body_bytes, body.len() as u64);
    }
}
