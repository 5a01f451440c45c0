//! HTTP response serialization.

use std::fmt;

/// Value of the `Server` header on every response.
pub const SERVER_NAME: &str = "padlink";

/// The status codes padlink ever sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    SwitchingProtocols,
    Ok,
    BadRequest,
    NotFound,
    MethodNotAllowed,
}

impl StatusCode {
    pub fn code(self) -> u16 {
        match self {
            StatusCode::SwitchingProtocols => 101,
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            StatusCode::SwitchingProtocols => "Switching Protocols",
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

/// A complete HTTP/1.1 response: status line, headers, optional body.
///
/// Headers are kept in insertion order so the serialized form is stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HandshakeResponse {
    /// Creates a response with no headers and no body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Appends a header and returns `self` for chaining.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// `101 Switching Protocols` completing a WebSocket upgrade.
    pub fn switching_protocols(accept: &str) -> Self {
        Self::new(StatusCode::SwitchingProtocols)
            .with_header("Upgrade", "websocket")
            .with_header("Connection", "Upgrade")
            .with_header("Sec-WebSocket-Accept", accept)
    }

    /// A response carrying `body`, with `Content-Type`, an exact
    /// `Content-Length`, and the standard `Server` and CORS headers.
    pub fn with_body(status: StatusCode, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        let mut response = Self::new(status)
            .with_header("Server", SERVER_NAME)
            .with_header("Access-Control-Allow-Origin", "*")
            .with_header("Content-Type", content_type)
            .with_header("Content-Length", body.len().to_string());
        response.body = body;
        response
    }

    pub fn ok(content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self::with_body(StatusCode::Ok, content_type, body)
    }

    pub fn not_found() -> Self {
        Self::with_body(StatusCode::NotFound, "text/html", "404 Not Found")
    }

    pub fn method_not_allowed() -> Self {
        Self::with_body(
            StatusCode::MethodNotAllowed,
            "text/html",
            "405 Method Not Allowed",
        )
        .with_header("Allow", "GET")
    }

    pub fn bad_request(reason: &str) -> Self {
        let body = format!("400 Bad Request: {reason}");
        Self::with_body(StatusCode::BadRequest, "text/plain", body)
    }

    /// Looks up the first header named `name`, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Serializes the response to wire bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!("HTTP/1.1 {}\r\n", self.status);
        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");

        let mut out = Vec::with_capacity(head.len() + self.body.len());
        out.extend_from_slice(head.as_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
