//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use forward_proxy::config::ProxyConfig;
use forward_proxy::net::Listener;
use forward_proxy::{ProxyServer, Shutdown};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Requests received by a mock origin, one entry per connection.
pub type Recorded = Arc<Mutex<Vec<Vec<u8>>>>;

/// A running proxy bound to an ephemeral loopback port.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub task: JoinHandle<()>,
}

/// Start the proxy on 127.0.0.1 with an OS-assigned port.
pub async fn start_proxy(mut config: ProxyConfig) -> TestProxy {
    config.listener.bind_host = "127.0.0.1".into();
    config.listener.port = 0;

    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = ProxyServer::new(config);

    let server_shutdown = shutdown.clone();
    let task = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    TestProxy { addr, shutdown, task }
}

/// Read a request head (through the blank line) from an origin-side socket.
async fn read_request_head(socket: &mut TcpStream) -> Vec<u8> {
    let mut reader = BufReader::new(socket);
    let mut head = Vec::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line).await.unwrap_or(0);
        head.extend_from_slice(&line);
        if n == 0 || line == b"\r\n" {
            return head;
        }
    }
}

/// Start a mock origin that answers every connection with `response` and
/// then closes, recording each request head it received.
pub async fn start_origin(response: Vec<u8>) -> (SocketAddr, Recorded) {
    start_gated_origin(response, None).await
}

/// Like [`start_origin`], but each connection waits for `gate` to be
/// notified before responding.
pub async fn start_gated_origin(response: Vec<u8>, gate: Option<Arc<Notify>>) -> (SocketAddr, Recorded) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorded: Recorded = Arc::default();
    let response = Arc::new(response);

    let log = Arc::clone(&recorded);
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else { break };
            let log = Arc::clone(&log);
            let response = Arc::clone(&response);
            let gate = gate.clone();
            tokio::spawn(async move {
                let head = read_request_head(&mut socket).await;
                log.lock().unwrap().push(head);
                if let Some(gate) = gate {
                    gate.notified().await;
                }
                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, recorded)
}

/// Start an origin that accepts connections and never answers.
pub async fn start_stalled_origin() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// A loopback address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Send raw bytes to the proxy and read until it closes the connection.
pub async fn send_raw(proxy: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream.write_all(request).await.unwrap();
    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(10), stream.read_to_end(&mut response))
        .await
        .expect("proxy did not close the connection")
        .unwrap();
    response
}

/// Canned origin response with a correct Content-Length.
pub fn http_response(status: &str, body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.0 {status}\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

/// Split a response into head (without the blank line) and body.
pub fn split_response(response: &[u8]) -> (String, Vec<u8>) {
    let idx = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has no header terminator");
    (
        String::from_utf8_lossy(&response[..idx]).into_owned(),
        response[idx + 4..].to_vec(),
    )
}
