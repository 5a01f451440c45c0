//! WebSocket frame codec (RFC 6455 §5.2).
//!
//! Wire format:
//! ```text
//! [FIN:1 RSV:3 opcode:4][MASK:1 len:7][ext_len:0|2|8][mask_key:0|4][payload:N]
//! ```
//! `len` values 0–125 are the payload length itself; 126 means "read a 16-bit
//! big-endian length next", 127 means "read a 64-bit big-endian length next".
//!
//! # Sans-I/O design
//!
//! The header helpers ([`FramePrefix`], [`check_capacity`], [`apply_mask`])
//! are shared by two decoders:
//!
//! - [`decode_frame`] works on a byte slice and reports
//!   [`FrameError::Incomplete`] when more bytes are needed.
//! - The bridge's async reader pulls exactly the bytes each header field needs
//!   from the socket, so an oversized frame is rejected before a single payload
//!   byte is read.

use thiserror::Error;

/// Payload capacity used when no explicit limit is configured.
pub const DEFAULT_PAYLOAD_CAPACITY: usize = 1024;

/// The close frame sent back to a client: FIN + opcode 0x8, empty unmasked payload.
pub const CLOSE_FRAME: [u8; 2] = [0x88, 0x00];

/// Size of the masking key that follows the length fields when MASK is set.
pub const MASK_KEY_SIZE: usize = 4;

/// Errors that can occur while decoding a frame.
#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    /// The byte slice ended before the frame was complete.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    Incomplete { needed: usize, available: usize },

    /// The declared payload length is larger than the receiver accepts.
    #[error("payload too large: frame declares {declared} bytes, capacity is {capacity}")]
    PayloadTooLarge { declared: u64, capacity: usize },
}

/// The 4-bit frame-type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
    /// A reserved opcode (0x3–0x7, 0xB–0xF).  Carried through so the caller
    /// can log it; the codec itself does not reject it.
    Other(u8),
}

impl From<u8> for OpCode {
    /// Maps the low 4 bits of `byte` to an opcode.  High bits are ignored.
    fn from(byte: u8) -> Self {
        match byte & 0x0F {
            0x0 => OpCode::Continuation,
            0x1 => OpCode::Text,
            0x2 => OpCode::Binary,
            0x8 => OpCode::Close,
            0x9 => OpCode::Ping,
            0xA => OpCode::Pong,
            other => OpCode::Other(other),
        }
    }
}

impl From<OpCode> for u8 {
    fn from(opcode: OpCode) -> Self {
        match opcode {
            OpCode::Continuation => 0x0,
            OpCode::Text => 0x1,
            OpCode::Binary => 0x2,
            OpCode::Close => 0x8,
            OpCode::Ping => 0x9,
            OpCode::Pong => 0xA,
            OpCode::Other(raw) => raw & 0x0F,
        }
    }
}

/// One decoded WebSocket frame with an owned, exactly-sized payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// `true` when this is the final fragment of a message.
    pub fin: bool,
    pub opcode: OpCode,
    /// Unmasked payload bytes.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Creates a final (`fin = true`) frame.
    pub fn new(opcode: OpCode, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            fin: true,
            opcode,
            payload: payload.into(),
        }
    }

    /// Creates a text frame.
    pub fn text(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(OpCode::Text, payload)
    }

    /// Creates an empty close frame.
    pub fn close() -> Self {
        Self::new(OpCode::Close, Vec::new())
    }
}

// ── Header helpers ────────────────────────────────────────────────────────────

/// The information carried by the first two bytes of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePrefix {
    pub fin: bool,
    pub opcode: OpCode,
    pub masked: bool,
    /// The raw 7-bit length field (0–127).
    pub length_field: u8,
}

impl FramePrefix {
    /// Number of bytes in the fixed prefix.
    pub const SIZE: usize = 2;

    /// Splits the two prefix bytes into their fields.
    pub fn parse(bytes: [u8; 2]) -> Self {
        Self {
            fin: bytes[0] & 0x80 != 0,
            opcode: OpCode::from(bytes[0]),
            masked: bytes[1] & 0x80 != 0,
            length_field: bytes[1] & 0x7F,
        }
    }

    /// How many extended-length bytes follow the prefix: 0, 2, or 8.
    pub fn extended_length_size(&self) -> usize {
        match self.length_field {
            126 => 2,
            127 => 8,
            _ => 0,
        }
    }

    /// How many mask-key bytes follow the length fields: 0 or 4.
    pub fn mask_key_size(&self) -> usize {
        if self.masked {
            MASK_KEY_SIZE
        } else {
            0
        }
    }

    /// Computes the declared payload length.
    ///
    /// `extended` must hold exactly [`extended_length_size`](Self::extended_length_size)
    /// bytes; they are read as one big-endian integer.
    pub fn payload_len(&self, extended: &[u8]) -> u64 {
        debug_assert_eq!(extended.len(), self.extended_length_size());
        if extended.is_empty() {
            return u64::from(self.length_field);
        }
        extended
            .iter()
            .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte))
    }
}

/// Rejects a declared length larger than `capacity`.
///
/// Returns the length as a `usize` on success.
///
/// # Errors
///
/// Returns [`FrameError::PayloadTooLarge`] when `declared > capacity`.
pub fn check_capacity(declared: u64, capacity: usize) -> Result<usize, FrameError> {
    match usize::try_from(declared) {
        Ok(len) if len <= capacity => Ok(len),
        _ => Err(FrameError::PayloadTooLarge { declared, capacity }),
    }
}

/// XORs `payload[i]` with `key[i % 4]` for every byte of `payload`.
///
/// Masking is its own inverse, so the same function masks and unmasks.
/// Exactly `payload.len()` bytes are touched.
pub fn apply_mask(payload: &mut [u8], key: [u8; MASK_KEY_SIZE]) {
    for (i, byte) in payload.iter_mut().enumerate() {
        *byte ^= key[i % MASK_KEY_SIZE];
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes one frame from the beginning of `bytes`.
///
/// Returns the frame and the total number of bytes consumed (header + payload)
/// so the caller can advance their read cursor.
///
/// The capacity check happens as soon as the length fields are available, so
/// an oversized frame is reported even when `bytes` holds only its header.
///
/// # Errors
///
/// - [`FrameError::PayloadTooLarge`] if the declared length exceeds `capacity`.
/// - [`FrameError::Incomplete`] if `bytes` ends before the frame does.
///
/// # Examples
///
/// ```rust
/// use padlink_core::protocol::frame::{decode_frame, OpCode};
///
/// // The masked "Hello" example from RFC 6455 §5.7.
/// let bytes = [0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58];
/// let (frame, consumed) = decode_frame(&bytes, 1024).unwrap();
/// assert_eq!(frame.opcode, OpCode::Text);
/// assert_eq!(frame.payload, b"Hello");
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn decode_frame(bytes: &[u8], capacity: usize) -> Result<(Frame, usize), FrameError> {
    require_len(bytes, FramePrefix::SIZE)?;
    let prefix = FramePrefix::parse([bytes[0], bytes[1]]);
    let mut offset = FramePrefix::SIZE;

    let ext_size = prefix.extended_length_size();
    require_len(bytes, offset + ext_size)?;
    let declared = prefix.payload_len(&bytes[offset..offset + ext_size]);
    offset += ext_size;

    let payload_len = check_capacity(declared, capacity)?;

    let mask_key = if prefix.masked {
        require_len(bytes, offset + MASK_KEY_SIZE)?;
        let key = [
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ];
        offset += MASK_KEY_SIZE;
        Some(key)
    } else {
        None
    };

    require_len(bytes, offset + payload_len)?;
    let mut payload = bytes[offset..offset + payload_len].to_vec();
    if let Some(key) = mask_key {
        apply_mask(&mut payload, key);
    }

    let frame = Frame {
        fin: prefix.fin,
        opcode: prefix.opcode,
        payload,
    };
    Ok((frame, offset + payload_len))
}

/// Encodes `frame` using the shortest length form.
///
/// Pass `Some(key)` to produce a client-style masked frame; servers send
/// unmasked frames (`None`).
///
/// # Examples
///
/// ```rust
/// use padlink_core::protocol::frame::{encode_frame, Frame, CLOSE_FRAME};
///
/// assert_eq!(encode_frame(&Frame::close(), None), CLOSE_FRAME);
/// ```
pub fn encode_frame(frame: &Frame, mask: Option<[u8; MASK_KEY_SIZE]>) -> Vec<u8> {
    let len = frame.payload.len();
    let mut buf = Vec::with_capacity(FramePrefix::SIZE + 8 + MASK_KEY_SIZE + len);

    let fin_bit = if frame.fin { 0x80 } else { 0x00 };
    buf.push(fin_bit | u8::from(frame.opcode));

    let mask_bit = if mask.is_some() { 0x80 } else { 0x00 };
    if len < 126 {
        buf.push(mask_bit | len as u8);
    } else if len <= usize::from(u16::MAX) {
        buf.push(mask_bit | 126);
        buf.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        buf.push(mask_bit | 127);
        buf.extend_from_slice(&(len as u64).to_be_bytes());
    }

    match mask {
        Some(key) => {
            buf.extend_from_slice(&key);
            let start = buf.len();
            buf.extend_from_slice(&frame.payload);
            apply_mask(&mut buf[start..], key);
        }
        None => buf.extend_from_slice(&frame.payload),
    }
    buf
}

// ── Utility helpers ───────────────────────────────────────────────────────────

fn require_len(buf: &[u8], needed: usize) -> Result<(), FrameError> {
    if buf.len() < needed {
        Err(FrameError::Incomplete {
            needed,
            available: buf.len(),
        })
    } else {
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
