// tests/integration/test_helpers.rs

//! Test helpers and utilities for integration tests

use async_trait::async_trait;
use parking_lot::Mutex;
use remoteplay::ServerHandle;
use remoteplay::config::Config;
use remoteplay::core::catalog::{CatalogError, CatalogProvider, FileCatalog};
use remoteplay::core::player::{Player, PlayerError, PlayerStateSnapshot, VirtualPlayer};
use remoteplay::server;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

pub const CATALOG_VERSION: i64 = 42;

/// How long a reply may take before a test fails.
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn catalog_document(version: i64) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<musicLibrary version=\"{version}\">\n  <artist name=\"Artist\"/>\n</musicLibrary>\n"
    )
}

fn init_tracing() {
    // Initialize tracing (ignore error if already initialized)
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("warn"))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// A player that records every call and checks that no two calls overlap.
#[derive(Default)]
pub struct RecordingPlayer {
    pub calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    /// Held inside every call to widen the window for overlaps.
    pub call_duration: Duration,
}

impl RecordingPlayer {
    pub fn with_call_duration(call_duration: Duration) -> Self {
        Self {
            call_duration,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.call_duration.is_zero() {
            std::thread::sleep(self.call_duration);
        }
        self.calls.lock().push(call);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Player for RecordingPlayer {
    fn play(&self, path: &str) -> Result<(), PlayerError> {
        self.record(format!("play {path}"));
        Ok(())
    }
    fn pause(&self) -> Result<(), PlayerError> {
        self.record("pause".into());
        Ok(())
    }
    fn unpause(&self) -> Result<(), PlayerError> {
        self.record("unpause".into());
        Ok(())
    }
    fn stop(&self) -> Result<(), PlayerError> {
        self.record("stop".into());
        Ok(())
    }
    fn snapshot(&self) -> PlayerStateSnapshot {
        self.record("snapshot".into());
        PlayerStateSnapshot::stopped()
    }
}

/// Wraps a catalog and counts how often it is consulted.
pub struct CountingCatalog {
    inner: FileCatalog,
    pub reads: AtomicUsize,
}

#[async_trait]
impl CatalogProvider for CountingCatalog {
    async fn current_version(&self) -> Result<i64, CatalogError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.current_version().await
    }

    async fn current_payload(&self) -> Result<String, CatalogError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.current_payload().await
    }
}

/// A running server plus the fixtures it was started with.
pub struct TestServer {
    pub handle: ServerHandle,
    pub catalog: Arc<CountingCatalog>,
    _dir: TempDir,
}

impl TestServer {
    /// Starts a server with the built-in virtual player.
    pub async fn start() -> Self {
        Self::start_with(Config::default(), Arc::new(VirtualPlayer::new())).await
    }

    pub async fn start_with_player(player: Arc<dyn Player>) -> Self {
        Self::start_with(Config::default(), player).await
    }

    /// Starts a server on an ephemeral localhost port, with a catalog at
    /// version `CATALOG_VERSION`.
    pub async fn start_with(mut config: Config, player: Arc<dyn Player>) -> Self {
        init_tracing();
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let catalog_path = dir.path().join("MusicLibrary.xml");
        std::fs::write(&catalog_path, catalog_document(CATALOG_VERSION))
            .expect("Failed to write catalog");

        config.host = "127.0.0.1".to_string();
        config.port = 0;
        config.catalog_path = catalog_path.display().to_string();

        let catalog = Arc::new(CountingCatalog {
            inner: FileCatalog::new(&catalog_path),
            reads: AtomicUsize::new(0),
        });
        let handle = server::start(config, player, catalog.clone())
            .await
            .expect("Failed to start server");
        Self {
            handle,
            catalog,
            _dir: dir,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.handle.local_addr()
    }

    pub async fn connect(&self) -> TestClient {
        TestClient::connect(self.addr()).await
    }

    pub fn catalog_reads(&self) -> usize {
        self.catalog.reads.load(Ordering::SeqCst)
    }
}

/// A line-oriented client.
pub struct TestClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr)
            .await
            .expect("Failed to connect to test server");
        let (read, writer) = stream.into_split();
        Self {
            lines: BufReader::new(read).lines(),
            writer,
        }
    }

    pub async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("Failed to write request");
    }

    /// Writes raw bytes, for requests that are not valid UTF-8.
    pub async fn send_bytes(&mut self, bytes: &[u8]) {
        self.writer
            .write_all(bytes)
            .await
            .expect("Failed to write request");
    }

    /// The next reply line, or `None` if the server closed the connection.
    pub async fn recv(&mut self) -> Option<String> {
        tokio::time::timeout(REPLY_TIMEOUT, self.lines.next_line())
            .await
            .expect("Timed out waiting for a reply")
            .expect("Failed to read reply")
    }

    /// Sends one request and returns its reply.
    pub async fn request(&mut self, line: &str) -> String {
        self.send(line).await;
        self.recv().await.expect("Connection closed before a reply")
    }

    /// Asserts nothing arrives within `window`.
    pub async fn expect_silence(&mut self, window: Duration) {
        if let Ok(line) = tokio::time::timeout(window, self.lines.next_line()).await {
            panic!("Expected no reply, got {line:?}");
        }
    }

    pub async fn authenticate(&mut self) {
        assert_eq!(self.request(r#"AUTHENTICATE "phone" "pass""#).await, "OK");
    }
}

/// Polls `condition` until it holds, failing the test after a few seconds.
pub async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + REPLY_TIMEOUT;
    while !condition() {
        assert!(Instant::now() < deadline, "Timed out waiting until {what}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
