//! padlink-bridge library crate.
//!
//! Serves a small web page and a WebSocket endpoint.  Commands the page sends
//! over the WebSocket are decoded by `padlink-core` and replayed on the host
//! through an [`application::InputInjector`].
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Browser (HTTP, then RFC 6455 frames)
//!         ↕
//! [padlink-bridge]
//!   ├── domain/            ServerConfig
//!   ├── application/       InputInjector, SharedInjector, ConnectionDispatcher
//!   └── infrastructure/
//!         ├── server/      accept loop, per-connection HTTP handling
//!         ├── ws_session/  async frame reader driving the dispatcher
//!         ├── assets/      static page loading
//!         ├── config_file/ TOML configuration
//!         └── injectors/   logging and recording backends
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `padlink-core` only; it is
//!   synchronous so the dispatch rules can be tested without a socket.
//! - `infrastructure` owns every socket, file, and tokio task.

/// Domain layer: configuration types (no I/O).
pub mod domain;

/// Application layer: injection capability and connection dispatch.
pub mod application;

/// Infrastructure layer: TCP server, WebSocket session, files, backends.
pub mod infrastructure;
