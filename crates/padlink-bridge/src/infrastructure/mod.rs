//! Infrastructure layer for padlink-bridge.
//!
//! Handles all I/O: the TCP listener, HTTP request heads, WebSocket frames on
//! the socket, static files, the config file, and the injector backends.
//!
//! # What does NOT belong here?
//!
//! - Parsing rules for HTTP heads, frames, or commands (`padlink-core`)
//! - Deciding what a frame means for the connection (application layer)

pub mod assets;
pub mod config_file;
pub mod injectors;
pub mod server;
pub mod ws_session;

pub use server::{run_server, serve};
pub use ws_session::{read_frame, run_ws_session, SessionError};
