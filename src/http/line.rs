//! Length-checked line reading.
//!
//! Lines are read into a caller-owned, growable buffer. A line longer than the
//! limit is reported instead of being truncated or split.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Outcome of reading one line.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadLine {
    /// A line was read; the buffer holds it including its terminator (if any).
    Line,
    /// The stream ended before any byte of a new line.
    Eof,
    /// The line would exceed the limit. Nothing past the limit was consumed.
    TooLong,
}

/// Read one `\n`-terminated line into `buf`, refusing lines over `limit` bytes.
///
/// A final line without a terminator is returned as [`ReadLine::Line`].
pub async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>, limit: usize) -> std::io::Result<ReadLine>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(if buf.is_empty() { ReadLine::Eof } else { ReadLine::Line });
        }

        let (complete, used) = match available.iter().position(|&b| b == b'\n') {
            Some(idx) => (true, idx + 1),
            None => (false, available.len()),
        };
        if buf.len() + used > limit {
            return Ok(ReadLine::TooLong);
        }
        buf.extend_from_slice(&available[..used]);
        reader.consume(used);

        if complete {
            return Ok(ReadLine::Line);
        }
    }
}

/// Strip a trailing `\r\n` or `\n`.
pub fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// True for a line consisting only of its terminator.
pub fn is_blank(line: &[u8]) -> bool {
    trim_line_end(line).is_empty()
}
