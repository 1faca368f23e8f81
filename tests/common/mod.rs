//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use spa_devd::config::{ServeConfig, WatchConfig};
use spa_devd::reload::{BuildError, ErrorSink};
use spa_devd::routing::Mapping;
use spa_devd::{AppBuilder, DevServer, HandlerRegistry, ReloadSupervisor};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Start a mock backend that answers every request with
/// `{method} {target} host={host}`. Returns its address.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = Vec::new();
                        let mut chunk = [0u8; 1024];
                        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut chunk).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                            }
                        }

                        let head = String::from_utf8_lossy(&buf).into_owned();
                        let mut lines = head.lines();
                        let request_line = lines.next().unwrap_or_default();
                        let mut words = request_line.split_whitespace();
                        let method = words.next().unwrap_or_default();
                        let target = words.next().unwrap_or_default();
                        let host = lines
                            .filter_map(|l| l.split_once(':'))
                            .find(|(name, _)| name.eq_ignore_ascii_case("host"))
                            .map(|(_, value)| value.trim())
                            .unwrap_or_default();

                        let body = format!("{method} {target} host={host}");
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// A running dev server with a live reload supervisor.
#[allow(dead_code)]
pub struct Harness {
    pub addr: SocketAddr,
    pub registry: Arc<HandlerRegistry>,
    pub shutdown: CancellationToken,
    pub supervisor: JoinHandle<Result<(), BuildError>>,
    pub server: JoinHandle<std::io::Result<()>>,
    pub sink: ErrorSink,
}

impl Harness {
    /// Serve `mappings`, with assets and data under `root`.
    pub async fn start(root: &Path, mappings: Vec<Mapping>) -> Self {
        let registry = Arc::new(HandlerRegistry::new());
        let shutdown = CancellationToken::new();
        let sink = ErrorSink::spawn();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(
            DevServer::new(registry.clone()).run(listener, shutdown.clone()),
        );

        let serve = ServeConfig {
            assets_dir: root.join("assets"),
            data_dir: root.join("data"),
            ..ServeConfig::default()
        };
        let watch = WatchConfig {
            poll_interval_ms: 20,
            always: Vec::new(),
        };
        let builder = AppBuilder::new(mappings, serve).unwrap();
        let supervisor = tokio::spawn(
            ReloadSupervisor::new(registry.clone(), builder, watch)
                .run(shutdown.clone(), sink.sender()),
        );

        Self {
            addr,
            registry,
            shutdown,
            supervisor,
            server,
            sink,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Wait until the first handler has been published.
    pub async fn ready(&self) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !self.registry.is_installed() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("handler was never published");
    }

    pub async fn stop(self) {
        self.shutdown.cancel();
        let built = tokio::time::timeout(Duration::from_secs(5), self.supervisor)
            .await
            .unwrap()
            .unwrap();
        assert!(built.is_ok());
        self.server.await.unwrap().unwrap();
        assert!(self.sink.close().await.is_empty());
    }
}

/// HTTP client that does not follow redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
