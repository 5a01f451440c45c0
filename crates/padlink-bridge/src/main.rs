//! padlink bridge: entry point.
//!
//! Serves the padlink page and its WebSocket endpoint so a phone or tablet
//! browser on the LAN can act as a keyboard and touchpad for this machine.
//!
//! # Usage
//!
//! ```text
//! padlink-bridge [OPTIONS]
//!
//! Options:
//!   --config <PATH>          TOML config file
//!   --bind <IP>              Listener IP address [default: 0.0.0.0]
//!   --port <PORT>            Listener port [default: 42142]
//!   --max-payload <BYTES>    Largest accepted frame payload [default: 1024]
//!   --www-dir <DIR>          Directory with index.html and icon.svg [default: www]
//!   --log-level <FILTER>     Log filter when RUST_LOG is unset [default: info]
//! ```
//!
//! # Configuration precedence
//!
//! Built-in defaults, then the `--config` file, then flags and environment
//! variables.  A flag given on the command line wins over its variable.
//!
//! | Variable              | Flag            |
//! |-----------------------|-----------------|
//! | `PADLINK_CONFIG`      | `--config`      |
//! | `PADLINK_BIND`        | `--bind`        |
//! | `PADLINK_PORT`        | `--port`        |
//! | `PADLINK_MAX_PAYLOAD` | `--max-payload` |
//! | `PADLINK_WWW_DIR`     | `--www-dir`     |
//!
//! # Architecture overview
//!
//! ```text
//! Browser  (HTTP, then WebSocket frames carrying DIRK/MOUS/BUTT commands)
//!       ↕
//! padlink-bridge  ← this process
//!   infrastructure/server      accept loop, HTTP heads
//!   infrastructure/ws_session  frame reader
//!   application/dispatcher     frames → commands → injector
//!       ↓
//! InputInjector  (logging backend by default)
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use padlink_bridge::application::SharedInjector;
use padlink_bridge::domain::ServerConfig;
use padlink_bridge::infrastructure::config_file::{self, FileConfig};
use padlink_bridge::infrastructure::injectors::LoggingInjector;
use padlink_bridge::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// padlink bridge.
///
/// Turns a browser into a keyboard and touchpad for this machine.
///
/// Every option is optional so that values from the config file survive
/// unless explicitly overridden.
#[derive(Debug, Parser)]
#[command(
    name = "padlink-bridge",
    about = "Serve the padlink page and replay its input commands on this host",
    version
)]
struct Cli {
    /// TOML configuration file with a `[server]` table.
    #[arg(long, env = "PADLINK_CONFIG")]
    config: Option<PathBuf>,

    /// IP address to bind.
    ///
    /// `0.0.0.0` accepts connections from the LAN; `127.0.0.1` only from this
    /// machine.
    #[arg(long, env = "PADLINK_BIND")]
    bind: Option<String>,

    /// TCP port to listen on.
    #[arg(long, env = "PADLINK_PORT")]
    port: Option<u16>,

    /// Largest WebSocket frame payload accepted, in bytes.
    #[arg(long, env = "PADLINK_MAX_PAYLOAD")]
    max_payload: Option<usize>,

    /// Directory holding `index.html` and `icon.svg`.
    #[arg(long, env = "PADLINK_WWW_DIR")]
    www_dir: Option<PathBuf>,

    /// `tracing` filter used when `RUST_LOG` is unset.
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Builds the effective [`ServerConfig`]: defaults, then the config file,
    /// then the options given on the command line or in the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or if a
    /// bind address is not a valid IP address.
    fn into_server_config(self) -> anyhow::Result<ServerConfig> {
        let file = match &self.config {
            Some(path) => config_file::load(path)
                .with_context(|| format!("failed to load config file {}", path.display()))?,
            None => FileConfig::default(),
        };
        let mut config = file
            .into_server_config()
            .context("invalid configuration file")?;

        if let Some(bind) = &self.bind {
            let ip: IpAddr = bind
                .parse()
                .with_context(|| format!("invalid bind address: '{bind}'"))?;
            config.bind_addr = SocketAddr::new(ip, config.bind_addr.port());
        }
        if let Some(port) = self.port {
            config.bind_addr.set_port(port);
        }
        if let Some(max_payload) = self.max_payload {
            anyhow::ensure!(max_payload > 0, "--max-payload must be at least 1");
            config.max_frame_payload = max_payload;
        }
        if let Some(www_dir) = self.www_dir {
            config.www_dir = www_dir;
        }
        if let Some(log_level) = self.log_level {
            config.log_level = log_level;
        }
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. CLI arguments (and their environment variables) are parsed.
/// 2. The effective [`ServerConfig`] is assembled.
/// 3. `tracing_subscriber` is initialised; `RUST_LOG` wins over the
///    configured level.
/// 4. A Ctrl+C handler clears the shared `running` flag.
/// 5. [`run_server`] accepts connections until the flag is cleared.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_server_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!(
        bind = %config.bind_addr,
        www_dir = %config.www_dir.display(),
        max_frame_payload = config.max_frame_payload,
        "padlink bridge starting"
    );

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    let injector = SharedInjector::new(LoggingInjector::new());
    run_server(config, injector, running).await?;

    info!("padlink bridge stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
