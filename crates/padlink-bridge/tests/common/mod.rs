//! Shared helpers for the padlink-bridge integration tests.
//!
//! Each test starts its own server on `127.0.0.1:0` with a
//! [`RecordingInjector`], so tests can run in parallel and assert exactly
//! which input events reached the host.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use padlink_bridge::application::SharedInjector;
use padlink_bridge::domain::ServerConfig;
use padlink_bridge::infrastructure::injectors::{EventLog, RecordingInjector};
use padlink_bridge::infrastructure::serve;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub struct TestServer {
    pub addr: SocketAddr,
    pub events: EventLog,
    pub injector: SharedInjector,
    running: Arc<AtomicBool>,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    /// Starts a server serving static files from `www_dir`.
    pub async fn start(www_dir: &Path) -> Self {
        Self::start_with(www_dir, 1024).await
    }

    pub async fn start_with(www_dir: &Path, max_frame_payload: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");

        let recorder = RecordingInjector::new();
        let events = recorder.events();
        let injector = SharedInjector::new(recorder);

        let config = ServerConfig {
            bind_addr: addr,
            max_frame_payload,
            www_dir: www_dir.to_path_buf(),
            ..ServerConfig::default()
        };
        let running = Arc::new(AtomicBool::new(true));
        let handle = tokio::spawn(serve(
            listener,
            config,
            injector.clone(),
            Arc::clone(&running),
        ));

        Self {
            addr,
            events,
            injector,
            running,
            handle,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Clears the running flag and waits for the accept loop to exit.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.running.store(false, Ordering::Relaxed);
        tokio::time::timeout(Duration::from_secs(2), self.handle)
            .await
            .expect("accept loop stops within the poll interval")
            .expect("server task does not panic")
    }

    /// Waits until every injection session has been released.
    pub async fn wait_for_idle(&self) {
        for _ in 0..100 {
            if self.injector.active_sessions() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "{} injection sessions still open",
            self.injector.active_sessions()
        );
    }
}

/// A parsed HTTP response read off a raw socket.
#[derive(Debug)]
pub struct RawResponse {
    pub status_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn status(&self) -> u16 {
        self.status_line
            .split_whitespace()
            .nth(1)
            .and_then(|code| code.parse().ok())
            .expect("status line has a numeric code")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw HTTP connection that can send several requests in a row.
pub struct RawClient {
    stream: BufReader<TcpStream>,
}

impl RawClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect to test server");
        Self {
            stream: BufReader::new(stream),
        }
    }

    pub async fn send(&mut self, bytes: &[u8]) {
        self.stream
            .get_mut()
            .write_all(bytes)
            .await
            .expect("write request");
    }

    /// Reads one response; the body length comes from `Content-Length`.
    pub async fn read_response(&mut self) -> RawResponse {
        let mut status_line = String::new();
        self.stream.read_line(&mut status_line).await.expect("status line");

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            self.stream.read_line(&mut line).await.expect("header line");
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            let (name, value) = line.split_once(':').expect("header has a colon");
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }

        let length = headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case("content-length"))
            .map(|(_, v)| v.parse::<usize>().expect("numeric Content-Length"))
            .unwrap_or(0);
        let mut body = vec![0u8; length];
        self.stream.read_exact(&mut body).await.expect("body");

        RawResponse {
            status_line: status_line.trim_end().to_string(),
            headers,
            body,
        }
    }

    pub async fn request(&mut self, bytes: &[u8]) -> RawResponse {
        self.send(bytes).await;
        self.read_response().await
    }

    /// Reads exactly `n` bytes.
    pub async fn read_bytes(&mut self, n: usize) -> Vec<u8> {
        let mut buf = vec![0u8; n];
        self.stream.read_exact(&mut buf).await.expect("read bytes");
        buf
    }

    /// Returns `true` if the server has closed the connection.
    pub async fn at_eof(&mut self) -> bool {
        let mut buf = [0u8; 1];
        matches!(
            tokio::time::timeout(Duration::from_secs(2), self.stream.read(&mut buf)).await,
            Ok(Ok(0)) | Ok(Err(_))
        )
    }
}
