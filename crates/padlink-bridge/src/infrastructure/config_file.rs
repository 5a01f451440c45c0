//! Optional TOML configuration file.
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0"
//! port = 42142
//! max_frame_payload = 1024
//! www_dir = "www"
//! log_level = "info"
//! ```
//!
//! Every field has a serde default, so a file may set only what it changes
//! and an empty file is valid.  CLI flags and environment variables are
//! applied on top of the result in `main.rs`.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::config::{ServerConfig, DEFAULT_LOG_LEVEL, DEFAULT_PORT, DEFAULT_WWW_DIR};
use padlink_core::protocol::frame::DEFAULT_PAYLOAD_CAPACITY;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid bind address {0:?}")]
    InvalidBindAddress(String),

    #[error("max_frame_payload must be at least 1")]
    ZeroPayloadCapacity,
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level file layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
}

/// The `[server]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    /// IP address to bind.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_frame_payload")]
    pub max_frame_payload: usize,
    #[serde(default = "default_www_dir")]
    pub www_dir: PathBuf,
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_max_frame_payload() -> usize {
    DEFAULT_PAYLOAD_CAPACITY
}
fn default_www_dir() -> PathBuf {
    PathBuf::from(DEFAULT_WWW_DIR)
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            max_frame_payload: default_max_frame_payload(),
            www_dir: default_www_dir(),
            log_level: default_log_level(),
        }
    }
}

impl FileConfig {
    /// Parses TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the TOML is malformed or a field has
    /// the wrong type.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Validates the file values and converts them to a [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBindAddress`] if `bind` is not an IP
    /// address, or [`ConfigError::ZeroPayloadCapacity`] for a zero capacity.
    pub fn into_server_config(self) -> Result<ServerConfig, ConfigError> {
        let server = self.server;
        let ip: IpAddr = server
            .bind
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddress(server.bind.clone()))?;
        if server.max_frame_payload == 0 {
            return Err(ConfigError::ZeroPayloadCapacity);
        }
        Ok(ServerConfig {
            bind_addr: SocketAddr::new(ip, server.port),
            max_frame_payload: server.max_frame_payload,
            www_dir: server.www_dir,
            log_level: server.log_level,
        })
    }
}

/// Loads a config file from `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read (including when it
/// does not exist, since the path was given explicitly) and
/// [`ConfigError::Parse`] if the TOML is malformed.
pub fn load(path: &Path) -> Result<FileConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    FileConfig::from_toml(&text)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
