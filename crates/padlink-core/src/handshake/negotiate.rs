//! Routing decision for one HTTP request.
//!
//! [`negotiate`] is pure: it inspects a parsed [`HandshakeRequest`] and
//! returns a [`Negotiation`] telling the caller what to do next.  Loading
//! static files and switching the socket into WebSocket mode are left to the
//! caller.

use tracing::debug;

use super::crypto::accept_key;
use super::request::HandshakeRequest;
use super::response::{HandshakeResponse, StatusCode};

/// Path at which WebSocket upgrades are accepted.
pub const WEBSOCKET_PATH: &str = "/ws";

/// Body returned for a plain `GET /ws` without upgrade headers.
pub const WEBSOCKET_ENDPOINT_BODY: &str = "This is the WebSocket endpoint.";

/// A file served for a fixed request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRoute {
    /// Request path, e.g. `/icon.svg`.
    pub path: String,
    /// File name relative to the asset directory.
    pub file: String,
    pub content_type: String,
}

impl StaticRoute {
    pub fn new(path: &str, file: &str, content_type: &str) -> Self {
        Self {
            path: path.to_string(),
            file: file.to_string(),
            content_type: content_type.to_string(),
        }
    }
}

/// The set of paths the server answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    websocket_path: String,
    static_routes: Vec<StaticRoute>,
}

impl Default for RouteTable {
    /// `/ws` for upgrades, `/` → `index.html` and `/icon.svg` → `icon.svg`.
    fn default() -> Self {
        Self::new(WEBSOCKET_PATH)
            .with_static(StaticRoute::new(
                "/",
                "index.html",
                "text/html; charset=utf-8",
            ))
            .with_static(StaticRoute::new("/icon.svg", "icon.svg", "image/svg+xml"))
    }
}

impl RouteTable {
    /// Creates a table with no static routes.
    pub fn new(websocket_path: &str) -> Self {
        Self {
            websocket_path: websocket_path.to_string(),
            static_routes: Vec::new(),
        }
    }

    pub fn with_static(mut self, route: StaticRoute) -> Self {
        self.static_routes.push(route);
        self
    }

    pub fn websocket_path(&self) -> &str {
        &self.websocket_path
    }

    pub fn static_routes(&self) -> &[StaticRoute] {
        &self.static_routes
    }

    pub fn find_static(&self, path: &str) -> Option<&StaticRoute> {
        self.static_routes.iter().find(|route| route.path == path)
    }
}

/// What the connection should do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Negotiation {
    /// Write the `101` response and switch to WebSocket framing.
    Upgrade(HandshakeResponse),
    /// Write the response and keep reading HTTP requests, unless its status
    /// is `400`.
    Respond(HandshakeResponse),
    /// Load the route's file and answer `200` with it, or `404` if missing.
    ServeStatic(StaticRoute),
}

impl Negotiation {
    /// Returns the status this decision resolves to, if already known.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Negotiation::Upgrade(response) | Negotiation::Respond(response) => {
                Some(response.status)
            }
            Negotiation::ServeStatic(_) => None,
        }
    }
}

/// Decides how to answer `request`.
///
/// Routing order: non-`GET` → 405; upgrade at the WebSocket path → 101 (or
/// 400 without a key); plain `GET` of the WebSocket path → 200 text; static
/// route → [`Negotiation::ServeStatic`]; anything else → 404.
///
/// # Examples
///
/// ```rust
/// use padlink_core::handshake::{negotiate, HandshakeRequest, Negotiation, RouteTable, StatusCode};
///
/// let req = HandshakeRequest::parse(b"GET /nope HTTP/1.1\r\n\r\n").unwrap();
/// match negotiate(&req, &RouteTable::default()) {
///     Negotiation::Respond(resp) => assert_eq!(resp.status, StatusCode::NotFound),
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub fn negotiate(request: &HandshakeRequest, routes: &RouteTable) -> Negotiation {
    if request.method != "GET" {
        debug!(method = %request.method, "rejecting non-GET request");
        return Negotiation::Respond(HandshakeResponse::method_not_allowed());
    }

    let path = request.route_path();
    if path == routes.websocket_path() {
        if !request.is_websocket_upgrade() {
            return Negotiation::Respond(HandshakeResponse::ok(
                "text/plain",
                WEBSOCKET_ENDPOINT_BODY,
            ));
        }
        return match request.websocket_key.as_deref() {
            Some(key) if !key.is_empty() => {
                Negotiation::Upgrade(HandshakeResponse::switching_protocols(&accept_key(key)))
            }
            _ => Negotiation::Respond(HandshakeResponse::bad_request(
                "missing Sec-WebSocket-Key",
            )),
        };
    }

    match routes.find_static(path) {
        Some(route) => Negotiation::ServeStatic(route.clone()),
        None => Negotiation::Respond(HandshakeResponse::not_found()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
