//! Outgoing request composition.
//!
//! The forwarded request is always `GET <path> HTTP/1.0` with
//! `Connection: close` and `Proxy-Connection: close`, so every origin
//! connection carries exactly one response and ends when that response ends.
//! The client's method has already been validated and is not carried over.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::config::ForwardingConfig;
use crate::http::{HeaderBlock, Target};

/// Builds and sends the rewritten request to the origin.
#[derive(Debug, Clone)]
pub struct RequestForwarder {
    user_agent: String,
}

impl RequestForwarder {
    pub fn new(config: &ForwardingConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
        }
    }

    /// Request line, canonical headers, then the filtered client headers.
    pub fn compose(&self, target: &Target, headers: &HeaderBlock) -> String {
        let mut request = format!(
            "GET {path} HTTP/1.0\r\n\
             Host: {host}\r\n\
             User-Agent: {agent}\r\n\
             Connection: close\r\n\
             Proxy-Connection: close\r\n",
            path = target.path,
            host = target.host,
            agent = self.user_agent,
        );
        headers.write_to(&mut request);
        request
    }

    /// Send the composed request as a single write.
    pub async fn send<W>(&self, origin: &mut W, request: &str) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        origin.write_all(request.as_bytes()).await?;
        origin.flush().await
    }
}
