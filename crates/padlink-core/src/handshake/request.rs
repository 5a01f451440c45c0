//! HTTP request head parsing.
//!
//! Only the request line and the header block are parsed.  A body declared
//! with `Content-Length` is measured so the caller can skip it; its bytes are
//! never interpreted.  Every field has an explicit maximum length and
//! exceeding it is an error rather than a silent truncation.

use std::collections::HashMap;

use thiserror::Error;

/// Largest request head (request line + headers + blank line) accepted.
pub const MAX_HEAD_BYTES: usize = 8192;
/// Largest method token, e.g. `GET`.
pub const MAX_METHOD_LEN: usize = 16;
/// Largest request target, e.g. `/icon.svg`.
pub const MAX_PATH_LEN: usize = 1024;
/// Largest header name.
pub const MAX_HEADER_NAME_LEN: usize = 64;
/// Largest header value.
pub const MAX_HEADER_VALUE_LEN: usize = 1024;
/// Largest number of header lines.
pub const MAX_HEADERS: usize = 64;
/// Largest request body the server will read past.
pub const MAX_BODY_BYTES: usize = 8192;

/// Errors raised while parsing a request head.
#[derive(Debug, Error, PartialEq)]
pub enum HttpError {
    /// The head contains bytes that are not valid UTF-8.
    #[error("request head is not valid UTF-8")]
    InvalidUtf8,

    /// The first line is not `METHOD PATH VERSION`.
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),

    /// A header line has no `:` or an invalid name.
    #[error("malformed header line: {0:?}")]
    MalformedHeader(String),

    /// A field is longer than its limit.
    #[error("{field} exceeds the limit of {limit}")]
    LimitExceeded { field: &'static str, limit: usize },

    /// `Content-Length` is not a decimal byte count.
    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),

    /// The body uses a `Transfer-Encoding` whose length cannot be known
    /// from the head.
    #[error("unsupported Transfer-Encoding: {0:?}")]
    UnsupportedTransferEncoding(String),
}

/// Header mapping with case-insensitive names.
///
/// Inserting a name that is already present replaces the previous value
/// (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    /// Keys are stored lowercased.
    inner: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a header.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.inner.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Looks up a header by name, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns `true` when the comma-separated value of `name` contains
    /// `token`, ignoring ASCII case.
    ///
    /// `Connection: keep-alive, Upgrade` contains the token `upgrade`.
    pub fn contains_token(&self, name: &str, token: &str) -> bool {
        self.get(name).is_some_and(|value| {
            value
                .split(',')
                .any(|part| part.trim().eq_ignore_ascii_case(token))
        })
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// A parsed HTTP request head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRequest {
    pub method: String,
    /// The request target exactly as sent, including any query string.
    pub path: String,
    pub version: String,
    pub headers: Headers,
    /// Raw `Sec-WebSocket-Key` value, if the client sent one.
    pub websocket_key: Option<String>,
    /// Body bytes following the head; `0` without `Content-Length`.
    pub content_length: usize,
}

impl HandshakeRequest {
    /// Parses a request head.
    ///
    /// Lines may end in `\r\n` or `\n`.  Parsing stops at the first empty
    /// line; anything after it is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the head is not UTF-8, the request line does
    /// not have exactly three tokens, a header line is malformed, any field
    /// exceeds its limit, or the body length cannot be determined.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use padlink_core::handshake::HandshakeRequest;
    ///
    /// let req = HandshakeRequest::parse(b"GET /ws HTTP/1.1\r\nHost: pad\r\n\r\n").unwrap();
    /// assert_eq!(req.method, "GET");
    /// assert_eq!(req.path, "/ws");
    /// assert_eq!(req.headers.get("host"), Some("pad"));
    /// ```
    pub fn parse(head: &[u8]) -> Result<Self, HttpError> {
        check_limit(head.len(), MAX_HEAD_BYTES, "request head")?;
        let text = std::str::from_utf8(head).map_err(|_| HttpError::InvalidUtf8)?;

        let mut lines = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line));

        let request_line = lines.next().unwrap_or_default();
        let mut tokens = request_line.split_whitespace();
        let (method, path, version) =
            match (tokens.next(), tokens.next(), tokens.next(), tokens.next()) {
                (Some(method), Some(path), Some(version), None) if version.starts_with("HTTP/") => {
                    (method, path, version)
                }
                _ => return Err(HttpError::MalformedRequestLine(request_line.to_string())),
            };
        check_limit(method.len(), MAX_METHOD_LEN, "method")?;
        check_limit(path.len(), MAX_PATH_LEN, "path")?;

        let mut headers = Headers::new();
        let mut count = 0;
        for line in lines {
            if line.is_empty() {
                break;
            }
            count += 1;
            check_limit(count, MAX_HEADERS, "header count")?;

            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| HttpError::MalformedHeader(line.to_string()))?;
            let name = name.trim();
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(HttpError::MalformedHeader(line.to_string()));
            }
            let value = value.trim();
            check_limit(name.len(), MAX_HEADER_NAME_LEN, "header name")?;
            check_limit(value.len(), MAX_HEADER_VALUE_LEN, "header value")?;

            headers.insert(name, value);
        }

        let websocket_key = headers.get("Sec-WebSocket-Key").map(str::to_string);
        let content_length = body_length(&headers)?;
        Ok(Self {
            method: method.to_string(),
            path: path.to_string(),
            version: version.to_string(),
            headers,
            websocket_key,
            content_length,
        })
    }

    /// The request target without its query string.
    pub fn route_path(&self) -> &str {
        self.path
            .split_once('?')
            .map_or(self.path.as_str(), |(path, _)| path)
    }

    /// Returns `true` when the request asks to switch to WebSocket.
    ///
    /// Requires `Upgrade` to contain the token `websocket` and `Connection`
    /// to contain the token `upgrade`, both case-insensitively.
    pub fn is_websocket_upgrade(&self) -> bool {
        self.headers.contains_token("Upgrade", "websocket")
            && self.headers.contains_token("Connection", "upgrade")
    }
}

fn body_length(headers: &Headers) -> Result<usize, HttpError> {
    if let Some(encoding) = headers.get("Transfer-Encoding") {
        if !encoding.eq_ignore_ascii_case("identity") {
            return Err(HttpError::UnsupportedTransferEncoding(encoding.to_string()));
        }
    }
    let Some(value) = headers.get("Content-Length") else {
        return Ok(0);
    };
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HttpError::InvalidContentLength(value.to_string()));
    }
    let length = value.parse::<usize>().map_err(|_| HttpError::LimitExceeded {
        field: "request body",
        limit: MAX_BODY_BYTES,
    })?;
    check_limit(length, MAX_BODY_BYTES, "request body")?;
    Ok(length)
}

fn check_limit(len: usize, limit: usize, field: &'static str) -> Result<(), HttpError> {
    if len > limit {
        Err(HttpError::LimitExceeded { field, limit })
    } else {
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
