//! Synthesized HTTP error responses.
//!
//! Always `HTTP/1.0`, `Content-type: text/html` and a `Content-length`
//! matching the body's byte length.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::ClientReport;

/// Status code plus the short message used on the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub code: u16,
    pub reason: &'static str,
}

impl Status {
    pub const BAD_REQUEST: Status = Status { code: 400, reason: "Bad request" };
    pub const NOT_FOUND: Status = Status { code: 404, reason: "Not found" };
    pub const URI_TOO_LONG: Status = Status { code: 414, reason: "URI too long" };
    pub const HEADER_FIELDS_TOO_LARGE: Status = Status {
        code: 431,
        reason: "Request header fields too large",
    };
    pub const NOT_IMPLEMENTED: Status = Status { code: 501, reason: "Not implemented" };
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code, self.reason)
    }
}

/// Render the full error response (status line, headers, HTML body).
pub fn render(report: &ClientReport) -> Vec<u8> {
    let status = report.status;
    let body = format!(
        "<html><title>Proxy Error</title><body bgcolor=\"ffffff\">\r\n\
         {}: {}\r\n\
         <p>{}: {}\r\n\
         <hr><em>forward-proxy</em>\r\n",
        status.code,
        status.reason,
        report.long_message,
        escape_html(&report.cause),
    );

    let mut response = format!(
        "HTTP/1.0 {} {}\r\nContent-type: text/html\r\nContent-length: {}\r\n\r\n",
        status.code,
        status.reason,
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body.as_bytes());
    response
}

/// Send the error response for `report` to the client.
pub async fn write_error<W>(writer: &mut W, report: &ClientReport) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&render(report)).await?;
    writer.flush().await
}

// The cause echoes client input back into HTML.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(status: Status, cause: &str) -> ClientReport {
        ClientReport {
            status,
            cause: cause.to_string(),
            long_message: "Proxy couldn't connect to the server",
        }
    }

    fn split(response: &[u8]) -> (String, String) {
        let text = String::from_utf8(response.to_vec()).unwrap();
        let (head, body) = text.split_once("\r\n\r\n").unwrap();
        (head.to_string(), body.to_string())
    }

    #[test]
    fn status_line_and_length_match_body() {
        let response = render(&report(Status::NOT_FOUND, "origin.invalid"));
        let (head, body) = split(&response);

        let mut lines = head.lines();
        assert_eq!(lines.next(), Some("HTTP/1.0 404 Not found"));
        assert_eq!(lines.next(), Some("Content-type: text/html"));
        assert_eq!(lines.next(), Some(format!("Content-length: {}", body.len()).as_str()));
        assert!(body.contains("404: Not found"));
        assert!(body.contains("Proxy couldn't connect to the server: origin.invalid"));
    }

    #[test]
    fn not_implemented_status_line() {
        let response = render(&report(Status::NOT_IMPLEMENTED, "POST"));
        assert!(response.starts_with(b"HTTP/1.0 501 Not implemented\r\n"));
    }

    #[test]
    fn cause_is_escaped() {
        let response = render(&report(Status::BAD_REQUEST, "<script>"));
        let (_, body) = split(&response);
        assert!(body.contains("&lt;script&gt;"));
        assert!(!body.contains("<script>"));
    }

    #[tokio::test]
    async fn writes_whole_response() {
        let mut out = Vec::new();
        let r = report(Status::NOT_IMPLEMENTED, "PUT");
        write_error(&mut out, &r).await.unwrap();
        assert_eq!(out, render(&r));
    }
}
