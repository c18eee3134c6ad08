//! Accept loop and connection task supervision.
//!
//! # Responsibilities
//! - Accept connections from the bounded [`Listener`]
//! - Spawn one task per connection into a `JoinSet`
//! - Reap finished tasks and log panics
//! - Stop accepting on shutdown and drain in-flight connections
//!
//! # Design Decisions
//! - Accept errors are logged and never end the loop
//! - A task's failure is confined to its own connection

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::task::{JoinError, JoinSet};
use tracing::Instrument;

use crate::config::ProxyConfig;
use crate::lifecycle::Shutdown;
use crate::net::{ConnectionPermit, ConnectionTracker, Listener, ListenerError};
use crate::observability::metrics;
use crate::proxy::connector::{OriginConnector, TcpConnector};
use crate::proxy::handler::ConnectionHandler;

/// The forward proxy server.
pub struct ProxyServer<C = TcpConnector> {
    config: Arc<ProxyConfig>,
    handler: Arc<ConnectionHandler<C>>,
    tracker: ConnectionTracker,
}

impl ProxyServer<TcpConnector> {
    /// Create a server that dials origins over plain TCP.
    pub fn new(config: ProxyConfig) -> Self {
        let connector = TcpConnector::new(&config.forwarding);
        Self::with_connector(config, connector)
    }
}

impl<C: OriginConnector> ProxyServer<C> {
    pub fn with_connector(config: ProxyConfig, connector: C) -> Self {
        let config = Arc::new(config);
        let handler = Arc::new(ConnectionHandler::new(Arc::clone(&config), connector));
        Self {
            config,
            handler,
            tracker: ConnectionTracker::new(),
        }
    }

    /// Run the accept loop until `shutdown` is triggered, then drain.
    pub async fn run(self, listener: Listener, shutdown: Shutdown) {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "Proxy server starting");
        }

        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.triggered() => break,
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    log_task_exit(joined);
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => self.spawn_connection(&mut tasks, stream, peer, permit),
                    Err(ListenerError::Closed) => break,
                    Err(e) => tracing::error!(error = %e, "Accept failed"),
                },
            }
        }

        self.drain(tasks).await;
        tracing::info!("Proxy server stopped");
    }

    fn spawn_connection(
        &self,
        tasks: &mut JoinSet<()>,
        stream: TcpStream,
        peer: SocketAddr,
        permit: ConnectionPermit,
    ) {
        metrics::record_accept();
        let guard = self.tracker.track();
        let span = tracing::info_span!("connection", connection_id = %guard.id(), peer_addr = %peer);
        span.in_scope(|| {
            tracing::info!(
                peer_host = %peer.ip(),
                peer_port = peer.port(),
                "Accepted connection"
            );
        });

        let handler = Arc::clone(&self.handler);
        tasks.spawn(
            async move {
                let _permit = permit;
                let _guard = guard;
                // Outcome is logged and counted by the handler itself.
                let _ = handler.handle(stream).await;
            }
            .instrument(span),
        );
    }

    async fn drain(&self, mut tasks: JoinSet<()>) {
        if tasks.is_empty() {
            return;
        }

        let grace = Duration::from_secs(self.config.listener.shutdown_grace_secs);
        tracing::info!(
            active_connections = self.tracker.active_count(),
            grace_secs = grace.as_secs(),
            "Draining connections"
        );

        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = tasks.join_next().await {
                log_task_exit(joined);
            }
        })
        .await;

        if drained.is_err() {
            tracing::warn!(remaining = tasks.len(), "Grace period elapsed, aborting connections");
            tasks.shutdown().await;
        }
    }
}

fn log_task_exit(joined: Result<(), JoinError>) {
    match joined {
        Ok(()) => {}
        Err(e) if e.is_panic() => tracing::error!(error = %e, "Connection task panicked"),
        Err(e) => tracing::debug!(error = %e, "Connection task cancelled"),
    }
}
