//! TCP server: accept loop and per-connection HTTP handling.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting connections and spawning one task per connection.
//! 3. Reading HTTP request heads, skipping any declared body, and answering
//!    them (page, 404, 405, 400) until a request upgrades the connection to
//!    WebSocket.
//! 4. Handing an upgraded connection to [`run_ws_session`].
//! 5. Stopping the accept loop when the `running` flag is cleared.
//!
//! # Isolation
//!
//! Every connection runs in its own tokio task and every error is handled
//! inside that task.  A malformed request or frame on one connection ends
//! that connection only; the accept loop and other connections never see it.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use padlink_core::handshake::MAX_HEAD_BYTES;
use padlink_core::{
    negotiate, HandshakeRequest, HandshakeResponse, Negotiation, RouteTable, StatusCode,
};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::application::{ConnectionDispatcher, SharedInjector};
use crate::domain::ServerConfig;
use crate::infrastructure::assets::AssetStore;
use crate::infrastructure::ws_session::{run_ws_session, SessionError};

/// How often the accept loop re-checks the `running` flag.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Everything a connection task needs, shared read-only across tasks.
struct ServerContext {
    routes: RouteTable,
    assets: AssetStore,
    injector: SharedInjector,
    max_frame_payload: usize,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `config.bind_addr` and serves until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound (port in use, missing
/// permission).
pub async fn run_server(
    config: ServerConfig,
    injector: SharedInjector,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("cannot bind {}", config.bind_addr))?;

    info!("padlink listening on http://{}", config.bind_addr);

    serve(listener, config, injector, running).await
}

/// Runs the accept loop on an already-bound listener.
///
/// Tests bind `127.0.0.1:0` and call this directly.
///
/// # Errors
///
/// Currently never fails; accept errors are logged and the loop continues.
pub async fn serve(
    listener: TcpListener,
    config: ServerConfig,
    injector: SharedInjector,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let ctx = Arc::new(ServerContext {
        routes: RouteTable::default(),
        assets: AssetStore::new(config.www_dir.clone()),
        injector,
        max_frame_payload: config.max_frame_payload,
    });

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        match timeout(ACCEPT_POLL_INTERVAL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                let ctx = Arc::clone(&ctx);
                tokio::spawn(handle_connection(stream, peer_addr, ctx));
            }
            Ok(Err(e)) => {
                error!("accept error: {e}");
            }
            Err(_) => {
                // No connection within the poll interval.
            }
        }
    }

    Ok(())
}

// ── Per-connection handler ────────────────────────────────────────────────────

/// Entry point of each connection task.  Logs the outcome inside a span
/// carrying a fresh session id.
async fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, ctx: Arc<ServerContext>) {
    let session_id = Uuid::new_v4();
    let span = info_span!("conn", %session_id, peer = %peer_addr);

    async move {
        info!("connection accepted");
        match serve_connection(stream, session_id, &ctx).await {
            Ok(()) => info!("connection closed"),
            Err(e) => warn!("connection closed with error: {e:#}"),
        }
    }
    .instrument(span)
    .await;
}

/// Answers HTTP requests on `stream` until it closes or upgrades.
async fn serve_connection(
    stream: TcpStream,
    session_id: Uuid,
    ctx: &ServerContext,
) -> anyhow::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    loop {
        let Some(head) = read_request_head(&mut reader)
            .await
            .context("failed to read request head")?
        else {
            debug!("peer closed before sending a request");
            return Ok(());
        };

        let request = match HandshakeRequest::parse(&head) {
            Ok(request) => request,
            Err(e) => {
                warn!("malformed request: {e}");
                let response = HandshakeResponse::bad_request(&e.to_string());
                write_response(&mut write_half, &response).await?;
                return Ok(());
            }
        };
        debug!(method = %request.method, path = %request.path, "request");

        if !discard_body(&mut reader, request.content_length).await? {
            debug!("peer closed inside a request body");
            return Ok(());
        }

        match negotiate(&request, &ctx.routes) {
            Negotiation::Upgrade(response) => {
                write_response(&mut write_half, &response).await?;
                info!("upgraded to WebSocket");

                let mut dispatcher = ConnectionDispatcher::new(&ctx.injector, session_id);
                return match run_ws_session(
                    &mut reader,
                    &mut write_half,
                    &mut dispatcher,
                    ctx.max_frame_payload,
                )
                .await
                {
                    Ok(()) | Err(SessionError::PeerClosed) => Ok(()),
                    Err(e) => Err(e).context("WebSocket session ended"),
                };
            }
            Negotiation::Respond(response) => {
                write_response(&mut write_half, &response).await?;
                if response.status == StatusCode::BadRequest {
                    return Ok(());
                }
            }
            Negotiation::ServeStatic(route) => {
                let response = ctx.assets.respond(&route).await;
                write_response(&mut write_half, &response).await?;
            }
        }
    }
}

/// Reads one request head (through the blank line) from `reader`.
///
/// Returns `Ok(None)` when the stream ends before a complete head.  A head
/// longer than [`MAX_HEAD_BYTES`] is returned truncated just past the limit
/// so the parser reports it.  Empty lines before the request line are
/// skipped.
async fn read_request_head<R>(reader: &mut R) -> std::io::Result<Option<Vec<u8>>>
where
    R: AsyncBufRead + Unpin,
{
    let mut head = Vec::new();
    loop {
        let line_start = head.len();
        let budget = (MAX_HEAD_BYTES + 1 - line_start) as u64;
        let read = (&mut *reader).take(budget).read_until(b'\n', &mut head).await?;
        if read == 0 {
            return Ok(None);
        }
        if head.len() > MAX_HEAD_BYTES {
            return Ok(Some(head));
        }

        let line = &head[line_start..];
        if line == b"\r\n" || line == b"\n" {
            if line_start == 0 {
                head.clear();
                continue;
            }
            return Ok(Some(head));
        }
    }
}

/// Reads and drops `len` body bytes so the next request head starts on a
/// clean boundary.  Returns `false` if the stream ended first.
async fn discard_body<R>(reader: &mut R, len: usize) -> anyhow::Result<bool>
where
    R: AsyncRead + Unpin,
{
    if len == 0 {
        return Ok(true);
    }
    let mut body = (&mut *reader).take(len as u64);
    let skipped = tokio::io::copy(&mut body, &mut tokio::io::sink())
        .await
        .context("failed to read request body")?;
    debug!(bytes = skipped, "request body discarded");
    Ok(skipped == len as u64)
}

async fn write_response<W>(writer: &mut W, response: &HandshakeResponse) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(&response.to_bytes())
        .await
        .with_context(|| format!("failed to write {} response", response.status))?;
    debug!(status = response.status.code(), "response sent");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
