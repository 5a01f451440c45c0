//! Async WebSocket session: reads frames off the socket and feeds them to
//! the [`ConnectionDispatcher`].
//!
//! The frame header is read field by field with `read_exact`, so the capacity
//! check happens as soon as the length is known and an oversized payload is
//! never read into memory.

use padlink_core::protocol::frame::{
    apply_mask, check_capacity, FramePrefix, CLOSE_FRAME, MASK_KEY_SIZE,
};
use padlink_core::{CommandError, Frame, FrameError};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::application::{
    ConnectionDispatcher, DispatchError, DispatchOutcome, InjectionError,
};

/// Longest extended length field (the 64-bit form).
const MAX_EXTENDED_LEN: usize = 8;

/// Reasons a WebSocket session ended other than a clean close handshake.
#[derive(Debug, Error)]
pub enum SessionError {
    /// End of stream while reading a frame.
    #[error("peer closed the connection")]
    PeerClosed,

    #[error("socket I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("input injection failed: {0}")]
    Injection(#[from] InjectionError),
}

impl From<DispatchError> for SessionError {
    fn from(error: DispatchError) -> Self {
        match error {
            DispatchError::Command(e) => SessionError::Command(e),
            DispatchError::Injection(e) => SessionError::Injection(e),
        }
    }
}

/// Reads one frame from `reader`.
///
/// # Errors
///
/// - [`SessionError::PeerClosed`] if the stream ends before the frame does.
/// - [`SessionError::Frame`] with [`FrameError::PayloadTooLarge`] when the
///   declared length exceeds `capacity`; no payload byte has been read.
/// - [`SessionError::Io`] for any other read failure.
pub async fn read_frame<R>(reader: &mut R, capacity: usize) -> Result<Frame, SessionError>
where
    R: AsyncRead + Unpin,
{
    let mut head = [0u8; FramePrefix::SIZE];
    read_exact(reader, &mut head).await?;
    let prefix = FramePrefix::parse(head);

    let mut extended_buf = [0u8; MAX_EXTENDED_LEN];
    let extended = &mut extended_buf[..prefix.extended_length_size()];
    read_exact(reader, extended).await?;
    let payload_len = check_capacity(prefix.payload_len(extended), capacity)?;

    let mask = if prefix.masked {
        let mut key = [0u8; MASK_KEY_SIZE];
        read_exact(reader, &mut key).await?;
        Some(key)
    } else {
        None
    };

    let mut payload = vec![0u8; payload_len];
    read_exact(reader, &mut payload).await?;
    if let Some(key) = mask {
        apply_mask(&mut payload, key);
    }

    Ok(Frame {
        fin: prefix.fin,
        opcode: prefix.opcode,
        payload,
    })
}

async fn read_exact<R>(reader: &mut R, buf: &mut [u8]) -> Result<(), SessionError>
where
    R: AsyncRead + Unpin,
{
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(SessionError::PeerClosed),
        Err(e) => Err(SessionError::Io(e)),
    }
}

/// Writes the close reply, tolerating a peer that is already gone.
async fn send_close<W>(writer: &mut W)
where
    W: AsyncWrite + Unpin,
{
    let result = match writer.write_all(&CLOSE_FRAME).await {
        Ok(()) => writer.flush().await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        debug!("close reply not delivered: {e}");
    }
}

/// Runs the frame loop until the connection ends.
///
/// Returns `Ok(())` after a close handshake initiated by the peer.  Every
/// other ending is an error; a close reply has been sent unless the error is
/// a read failure.  The dispatcher is `Closed` on return.
///
/// # Errors
///
/// See [`SessionError`].
pub async fn run_ws_session<R, W>(
    reader: &mut R,
    writer: &mut W,
    dispatcher: &mut ConnectionDispatcher,
    capacity: usize,
) -> Result<(), SessionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let frame = match read_frame(reader, capacity).await {
            Ok(frame) => frame,
            Err(SessionError::Frame(e)) => {
                dispatcher.on_frame_error(&e);
                send_close(writer).await;
                dispatcher.close();
                return Err(SessionError::Frame(e));
            }
            Err(e) => {
                dispatcher.on_peer_closed();
                return Err(e);
            }
        };

        debug!(opcode = ?frame.opcode, len = frame.payload.len(), "frame received");

        match dispatcher.on_frame(&frame) {
            Ok(DispatchOutcome::Continue) => {}
            Ok(DispatchOutcome::Close) => {
                send_close(writer).await;
                dispatcher.close();
                return Ok(());
            }
            Err(e) => {
                send_close(writer).await;
                dispatcher.close();
                return Err(e.into());
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
