//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use path_redirector::config::RedirectorConfig;
use path_redirector::http::HttpServer;
use path_redirector::lifecycle::Shutdown;
use path_redirector::store::BoxRuleStore;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Start a mock upstream that answers every request with `200` and a body of
/// `"{response}:{request path}"`.
pub async fn start_mock_backend(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let head = String::from_utf8_lossy(&buf[..n]);
                let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();

                let body = format!("{}:{}", response, path);
                let response_str = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response_str.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// A running redirector.
pub struct TestRedirector {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<RedirectorConfig>,
}

impl TestRedirector {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestRedirector {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a redirector on an ephemeral port, optionally with an explicit store.
pub async fn start_redirector(config: RedirectorConfig, store: Option<BoxRuleStore>) -> TestRedirector {
    let server = match store {
        Some(store) => HttpServer::with_store(config, store),
        None => HttpServer::new(config).unwrap(),
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    // Wait until the initial rule load is done and the listener answers
    let client = client();
    for _ in 0..50 {
        if client
            .get(format!("http://{}/healthz", addr))
            .send()
            .await
            .is_ok()
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    TestRedirector {
        addr,
        shutdown,
        config_updates,
    }
}

/// HTTP client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
