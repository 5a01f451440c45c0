//! Server configuration types.
//!
//! [`ServerConfig`] is the single source of truth for runtime settings.  It
//! is assembled once at startup (defaults, then the TOML file, then CLI flags
//! and environment variables) and shared read-only with every connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use padlink_core::protocol::frame::DEFAULT_PAYLOAD_CAPACITY;

/// Default TCP port the bridge listens on.
pub const DEFAULT_PORT: u16 = 42142;

/// Default directory holding `index.html` and `icon.svg`.
pub const DEFAULT_WWW_DIR: &str = "www";

/// Default `tracing` filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// All runtime configuration for the bridge.
///
/// # Example
///
/// ```rust
/// use padlink_bridge::domain::ServerConfig;
///
/// let cfg = ServerConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 42142);
/// assert_eq!(cfg.max_frame_payload, 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address and port of the TCP listener.
    ///
    /// `0.0.0.0` lets phones and tablets on the LAN reach the page; use
    /// `127.0.0.1` to restrict the bridge to the local machine.
    pub bind_addr: SocketAddr,

    /// Largest WebSocket frame payload accepted, in bytes.  A frame declaring
    /// more closes the connection.
    pub max_frame_payload: usize,

    /// Directory the static routes are served from.
    pub www_dir: PathBuf,

    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServerConfig {
    /// | Field             | Default         |
    /// |-------------------|-----------------|
    /// | bind_addr         | `0.0.0.0:42142` |
    /// | max_frame_payload | `1024`          |
    /// | www_dir           | `www`           |
    /// | log_level         | `info`          |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            max_frame_payload: DEFAULT_PAYLOAD_CAPACITY,
            www_dir: PathBuf::from(DEFAULT_WWW_DIR),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
