//! Origin connection establishment.
//!
//! Resolution and connect failures are deliberately collapsed into a single
//! [`ProxyError::ConnectFailed`].

use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::config::ForwardingConfig;
use crate::error::ProxyError;
use crate::http::Target;

/// Opens a byte stream to the origin named by a [`Target`].
pub trait OriginConnector: Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    fn connect(&self, target: &Target) -> impl Future<Output = Result<Self::Stream, ProxyError>> + Send;
}

/// Plain TCP connector with an optional connect deadline.
#[derive(Debug, Clone, Default)]
pub struct TcpConnector {
    connect_timeout: Option<Duration>,
}

impl TcpConnector {
    pub fn new(config: &ForwardingConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout_secs.map(Duration::from_secs),
        }
    }
}

impl OriginConnector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&self, target: &Target) -> impl Future<Output = Result<TcpStream, ProxyError>> + Send {
        let host = target.host.clone();
        let port = target.port.clone();
        let connect_timeout = self.connect_timeout;

        async move {
            let authority = format!("{host}:{port}");
            let attempt = TcpStream::connect(authority);
            let result = match connect_timeout {
                Some(limit) => match tokio::time::timeout(limit, attempt).await {
                    Ok(result) => result,
                    Err(_) => Err(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        format!("no connection within {}s", limit.as_secs()),
                    )),
                },
                None => attempt.await,
            };

            result.map_err(|source| ProxyError::ConnectFailed { host, port, source })
        }
    }
}
