//! Static page loading for the routes in the [`RouteTable`](padlink_core::RouteTable).

use std::path::{Path, PathBuf};

use padlink_core::{HandshakeResponse, StaticRoute};
use tracing::{debug, warn};

/// Reads static route files from a directory on each request.
///
/// Files are read fresh every time so the page can be edited while the
/// bridge is running.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Builds the response for `route`: `200` with the file contents, or
    /// `404` if the file cannot be read.
    pub async fn respond(&self, route: &StaticRoute) -> HandshakeResponse {
        let path = self.root.join(&route.file);
        match tokio::fs::read(&path).await {
            Ok(body) => {
                debug!(path = %path.display(), bytes = body.len(), "serving static file");
                HandshakeResponse::ok(&route.content_type, body)
            }
            Err(e) => {
                warn!(path = %path.display(), "static file unavailable: {e}");
                HandshakeResponse::not_found()
            }
        }
    }
}
