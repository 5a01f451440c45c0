//! HTTP side of the connection: request parsing, routing, and the WebSocket
//! opening handshake.
//!
//! Everything here is synchronous and operates on byte slices.  The bridge
//! service reads a request head off the socket, hands it to
//! [`HandshakeRequest::parse`], asks [`negotiate`] what to do, and writes
//! [`HandshakeResponse::to_bytes`] back.

pub mod crypto;
pub mod negotiate;
pub mod request;
pub mod response;

pub use crypto::{accept_key, WEBSOCKET_GUID};
pub use negotiate::{negotiate, Negotiation, RouteTable, StaticRoute, WEBSOCKET_PATH};
pub use request::{HandshakeRequest, Headers, HttpError, MAX_BODY_BYTES, MAX_HEAD_BYTES};
pub use response::{HandshakeResponse, StatusCode};
