//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use audit_gateway::audit::{AuditStore, MemoryAuditStore};
use audit_gateway::{GatewayConfig, HttpServer, Shutdown};

/// Start a mock upstream that answers every request with `response` and
/// keeps the raw request text it received.
#[allow(dead_code)]
pub async fn start_recording_backend(
    addr: SocketAddr,
    response: &'static str,
) -> Arc<Mutex<Vec<String>>> {
    let listener = TcpListener::bind(addr).await.unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let recorder = recorder.clone();
            tokio::spawn(async move {
                let raw = read_request(&mut socket).await;
                recorder.lock().unwrap().push(raw);

                let response_str = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    response.len(),
                    response
                );
                let _ = socket.write_all(response_str.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    seen
}

/// Read one request: headers, then `content-length` bytes of body.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&data).to_string();
        if let Some(end) = text.find("\r\n\r\n") {
            let content_length = text[..end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&data).to_string()
}

/// Start the gateway on `addr` over an in-memory audit store.
pub async fn start_gateway(
    addr: SocketAddr,
    mut config: GatewayConfig,
) -> (Shutdown, Arc<MemoryAuditStore>) {
    config.listener.bind_address = addr.to_string();
    config.observability.metrics_enabled = false;

    let store = Arc::new(MemoryAuditStore::new(config.audit.table.clone()));
    let server = HttpServer::with_store(config, store.clone() as Arc<dyn AuditStore>);

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (_, admission_updates) = mpsc::unbounded_channel();
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        let _ = server.run(listener, admission_updates, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(200)).await;

    (shutdown, store)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
