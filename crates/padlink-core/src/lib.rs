//! # padlink-core
//!
//! Protocol library for padlink: a small bridge that lets a browser drive the
//! host's keyboard and pointer over a WebSocket connection.
//!
//! This crate has zero dependencies on sockets, async runtimes, or OS input
//! APIs.  Every function works on byte slices and returns typed values, which
//! keeps the parsing rules testable without a network.
//!
//! # Architecture overview (for beginners)
//!
//! A browser session goes through two phases:
//!
//! 1. **HTTP** – the browser sends a normal HTTP request.  Most paths get an
//!    ordinary response (a page, a 404, a 405).  A request for `/ws` carrying
//!    the `Upgrade: websocket` headers is answered with
//!    `101 Switching Protocols` and the connection changes language.
//! 2. **WebSocket** – from then on every message arrives wrapped in an
//!    RFC 6455 *frame*.  Text frames carry compact input commands such as
//!    `DIRKr\n` (tap the right arrow key) or `MOUS8000ffff\n` (move the
//!    pointer to the bottom centre of the screen).
//!
//! The modules follow that flow:
//!
//! - **`handshake`** – parses the HTTP request head, decides how to answer it,
//!   and computes the `Sec-WebSocket-Accept` value.
//!
//! - **`protocol`** – the WebSocket frame codec and the command decoder that
//!   turns a frame payload into an ordered list of input [`Command`]s.

pub mod handshake;
pub mod protocol;

// Re-export the most-used items at the crate root so callers can write
// `padlink_core::decode_frame` instead of `padlink_core::protocol::frame::decode_frame`.
pub use handshake::{
    accept_key, negotiate, HandshakeRequest, HandshakeResponse, HttpError, Negotiation,
    RouteTable, StaticRoute, StatusCode,
};
pub use protocol::command::{
    decode_commands, Command, CommandError, Commands, Direction, MouseButton,
};
pub use protocol::frame::{decode_frame, encode_frame, Frame, FrameError, OpCode};
