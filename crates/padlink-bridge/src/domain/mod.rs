//! Domain layer for padlink-bridge.
//!
//! Plain data types with no dependencies on sockets, files, or the async
//! runtime.  The infrastructure layer fills them in from the CLI, the
//! environment, and the optional config file.

pub mod config;

pub use config::ServerConfig;
