//! Per-connection request handling.
//!
//! # Steps
//! 1. Read the request line (client gone before it → silent close)
//! 2. Validate the method (anything but GET/HEAD → 501, no origin dial)
//! 3. Parse the target URL
//! 4. Read and filter the request headers
//! 5. Connect to the origin (failure → 404 naming the host)
//! 6. Forward the rewritten request
//! 7. Relay the response
//! 8. Close both sockets on every path
//!
//! Nothing here is shared with other connections except the read-only config.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::config::ProxyConfig;
use crate::error::{LineKind, ProxyError};
use crate::http::line::{self, ReadLine};
use crate::http::{error, headers, Method, RequestLine, Target};
use crate::observability::metrics;
use crate::proxy::connector::OriginConnector;
use crate::proxy::forwarder::RequestForwarder;
use crate::proxy::relay::{RelayStats, ResponseRelay};

/// How a connection ended without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exchange {
    /// The client closed before sending a request line.
    ClientClosed,
    /// The origin response was relayed until the origin closed.
    Relayed {
        method: Method,
        target: Target,
        stats: RelayStats,
    },
}

impl Exchange {
    fn outcome(&self) -> &'static str {
        match self {
            Exchange::ClientClosed => "client_closed",
            Exchange::Relayed { .. } => "relayed",
        }
    }
}

/// Runs the proxy pipeline for one client connection.
pub struct ConnectionHandler<C> {
    config: Arc<ProxyConfig>,
    forwarder: RequestForwarder,
    connector: C,
}

impl<C: OriginConnector> ConnectionHandler<C> {
    pub fn new(config: Arc<ProxyConfig>, connector: C) -> Self {
        let forwarder = RequestForwarder::new(&config.forwarding);
        Self {
            config,
            forwarder,
            connector,
        }
    }

    /// Handle one client connection to completion.
    ///
    /// Failures detected before the relay are answered with an error response.
    /// The client stream is shut down and dropped before this returns.
    pub async fn handle<S>(&self, client: S) -> Result<Exchange, ProxyError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (read_half, mut write_half) = tokio::io::split(client);
        let mut reader = BufReader::new(read_half);

        let result = self.exchange(&mut reader, &mut write_half).await;

        match &result {
            Ok(exchange) => {
                if let Exchange::Relayed { stats, .. } = exchange {
                    tracing::debug!(
                        header_bytes = stats.header_bytes,
                        body_bytes = stats.body_bytes,
                        headers_complete = stats.headers_complete,
                        "Relay complete"
                    );
                    metrics::record_relayed_bytes(stats.total());
                }
                metrics::record_request(exchange.outcome());
            }
            Err(err) => {
                if let Some(report) = err.client_report() {
                    tracing::warn!(status = report.status.code, error = %err, "Rejecting request");
                    if let Err(e) = error::write_error(&mut write_half, &report).await {
                        tracing::debug!(error = %e, "Could not deliver error response");
                    }
                } else {
                    tracing::warn!(error = %err, "Connection failed");
                }
                metrics::record_request(err.outcome());
            }
        }

        if let Err(e) = write_half.shutdown().await {
            tracing::trace!(error = %e, "Client shutdown failed");
        }
        result
    }

    async fn exchange<R, W>(&self, reader: &mut R, writer: &mut W) -> Result<Exchange, ProxyError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let limits = &self.config.limits;

        let mut buf = Vec::with_capacity(256);
        match line::read_line(reader, &mut buf, limits.max_line_bytes).await? {
            ReadLine::Eof => {
                tracing::debug!("Client closed before sending a request");
                return Ok(Exchange::ClientClosed);
            }
            ReadLine::TooLong => {
                return Err(ProxyError::LineTooLong {
                    kind: LineKind::RequestLine,
                    limit: limits.max_line_bytes,
                })
            }
            ReadLine::Line => {}
        }

        let request_line = RequestLine::parse(&buf)?;
        let method = match request_line.method() {
            Ok(method) => method,
            Err(err) => {
                // Consume the rest of the request head before answering, so
                // closing with unread input does not reset the connection.
                let _ = headers::read_headers(reader, limits).await;
                return Err(err);
            }
        };
        let target = Target::parse(&request_line.target);
        tracing::debug!(
            method = %method,
            version = %request_line.version,
            host = %target.host,
            port = %target.port,
            path = %target.path,
            "Parsed request"
        );

        let header_block = headers::read_headers(reader, limits).await?;

        let mut origin = self.connector.connect(&target).await?;
        let request = self.forwarder.compose(&target, &header_block);
        self.forwarder.send(&mut origin, &request).await?;
        tracing::debug!(
            origin = %target.authority(),
            forwarded_headers = header_block.len(),
            "Request forwarded"
        );

        let mut origin = BufReader::new(origin);
        let stats = ResponseRelay::new()
            .run(&mut origin, writer)
            .await?;

        Ok(Exchange::Relayed {
            method,
            target,
            stats,
        })
    }
}
