//! Digest helpers for the WebSocket opening handshake.
//!
//! # How the accept value works (for beginners)
//!
//! The browser proves it is really speaking WebSocket by sending a random
//! `Sec-WebSocket-Key`.  The server appends a fixed GUID defined by RFC 6455,
//! hashes the result with SHA-1, and sends the base64 of that digest back as
//! `Sec-WebSocket-Accept`.  The browser repeats the computation and refuses
//! the connection if the two values differ.  This is not a security measure;
//! it only stops a plain HTTP server from accidentally accepting a WebSocket
//! handshake it does not understand.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha1::{Digest, Sha1};

/// The fixed GUID from RFC 6455 §1.3.
pub const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Length of a SHA-1 digest in bytes.
pub const SHA1_DIGEST_LEN: usize = 20;

/// Encodes `data` as standard base64 (RFC 4648 §4) with `=` padding.
pub fn base64_encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Computes the SHA-1 digest of the concatenation of `parts`.
pub fn sha1_digest(parts: &[&[u8]]) -> [u8; SHA1_DIGEST_LEN] {
    let mut hasher = Sha1::new();
    for part in parts {
        hasher.update(part);
    }
    let mut digest = [0u8; SHA1_DIGEST_LEN];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// Computes the `Sec-WebSocket-Accept` value for a client key.
///
/// # Examples
///
/// ```rust
/// use padlink_core::handshake::crypto::accept_key;
///
/// assert_eq!(accept_key("dGhlIHNhbXBsZSBub25jZQ=="), "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
/// ```
pub fn accept_key(client_key: &str) -> String {
    let digest = sha1_digest(&[client_key.as_bytes(), WEBSOCKET_GUID.as_bytes()]);
    base64_encode(&digest)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
