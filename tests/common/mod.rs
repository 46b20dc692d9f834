//! Shared utilities for integration testing.
//!
//! Mock backends speak just enough HTTP/1.1 for a probe: read the request
//! head, answer with a status line, close.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use endpoint_sentinel::config::{EndpointConfig, MonitorConfig};

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

async fn read_request_head(socket: &mut TcpStream) {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 512];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    return;
                }
            }
        }
    }
}

/// Start a mock backend that always answers with `status`.
pub async fn start_mock_backend(status: u16) -> SocketAddr {
    start_programmable_backend(move || async move { (status, String::new()) }).await
}

/// Start a programmable mock backend; `f` is called once per request.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                read_request_head(&mut socket).await;
                let (status, body) = f().await;
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason(status),
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Start a backend that accepts connections and never answers.
pub async fn start_hanging_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                read_request_head(&mut socket).await;
                tokio::time::sleep(Duration::from_secs(3600)).await;
                drop(socket);
            });
        }
    });

    addr
}

/// An address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn health_url(addr: SocketAddr) -> String {
    format!("http://{}/health_check", addr)
}

/// Config with short timeouts for the given `(name, url)` pairs.
pub fn test_config(endpoints: &[(&str, String)]) -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.endpoints = endpoints
        .iter()
        .map(|(name, url)| EndpointConfig {
            name: name.to_string(),
            url: url.clone(),
        })
        .collect();
    config.probe.connect_timeout_secs = 1;
    config.probe.read_timeout_secs = 1;
    config.schedule.deadline_grace_secs = 1;
    config
}
