//! Integration tests for the HTTP side of the bridge over real sockets.
//!
//! Verifies routing (404, 405, static pages, the plain `/ws` description),
//! keep-alive after non-fatal responses, and that a malformed request gets a
//! 400 and a closed connection.

mod common;

use common::{RawClient, TestServer};
use padlink_core::protocol::frame::CLOSE_FRAME;
use padlink_core::{accept_key, encode_frame, Frame};

const UPGRADE: &[u8] = b"GET /ws HTTP/1.1\r\n\
    Host: localhost\r\n\
    Upgrade: websocket\r\n\
    Connection: Upgrade\r\n\
    Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
    Sec-WebSocket-Version: 13\r\n\r\n";

#[tokio::test]
async fn test_not_found_then_next_request_on_same_connection() {
    // Arrange
    let www = tempfile::tempdir().unwrap();
    let server = TestServer::start(www.path()).await;
    let mut client = RawClient::connect(server.addr).await;

    // Act
    let first = client.request(b"GET /nope HTTP/1.1\r\n\r\n").await;
    let second = client.request(b"GET /ws HTTP/1.1\r\n\r\n").await;

    // Assert
    assert_eq!(first.status(), 404);
    assert_eq!(
        first.header("Content-Length"),
        Some(first.body.len().to_string().as_str())
    );
    assert_eq!(second.status(), 200);
    assert_eq!(second.body, b"This is the WebSocket endpoint.");

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_non_get_is_method_not_allowed_and_connection_stays_open() {
    let www = tempfile::tempdir().unwrap();
    let server = TestServer::start(www.path()).await;
    let mut client = RawClient::connect(server.addr).await;

    let response = client.request(b"POST / HTTP/1.1\r\nContent-Length: 0\r\n\r\n").await;
    assert_eq!(response.status(), 405);
    assert_eq!(response.header("Allow"), Some("GET"));

    let again = client.request(b"GET /nope HTTP/1.1\r\n\r\n").await;
    assert_eq!(again.status(), 404);
}

#[tokio::test]
async fn test_request_body_is_skipped_before_next_request() {
    // Arrange
    let www = tempfile::tempdir().unwrap();
    let server = TestServer::start(www.path()).await;
    let mut client = RawClient::connect(server.addr).await;

    // Act: body and the following request arrive in one write.
    client
        .send(b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhelloGET /nope HTTP/1.1\r\n\r\n")
        .await;
    let first = client.read_response().await;
    let second = client.read_response().await;

    // Assert
    assert_eq!(first.status(), 405);
    assert_eq!(second.status(), 404);
}

#[tokio::test]
async fn test_body_split_across_writes_is_skipped() {
    let www = tempfile::tempdir().unwrap();
    let server = TestServer::start(www.path()).await;
    let mut client = RawClient::connect(server.addr).await;

    client.send(b"GET /nope HTTP/1.1\r\nContent-Length: 10\r\n\r\nhello").await;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    client.send(b"worldGET /ws HTTP/1.1\r\n\r\n").await;
    let first = client.read_response().await;
    let second = client.read_response().await;

    assert_eq!(first.status(), 404);
    assert_eq!(second.status(), 200);
    assert_eq!(second.body, b"This is the WebSocket endpoint.");
}

#[tokio::test]
async fn test_oversized_body_gets_400_and_close() {
    let www = tempfile::tempdir().unwrap();
    let server = TestServer::start(www.path()).await;
    let mut client = RawClient::connect(server.addr).await;

    let request = format!(
        "POST / HTTP/1.1\r\nContent-Length: {}\r\n\r\n",
        padlink_core::handshake::MAX_BODY_BYTES + 1
    );
    let response = client.request(request.as_bytes()).await;

    assert_eq!(response.status(), 400);
    assert!(client.at_eof().await);
}

#[tokio::test]
async fn test_static_pages_are_served_from_www_dir() {
    // Arrange
    let www = tempfile::tempdir().unwrap();
    std::fs::write(www.path().join("index.html"), "<h1>pad</h1>").unwrap();
    let server = TestServer::start(www.path()).await;
    let mut client = RawClient::connect(server.addr).await;

    // Act
    let index = client.request(b"GET / HTTP/1.1\r\n\r\n").await;
    let icon = client.request(b"GET /icon.svg HTTP/1.1\r\n\r\n").await;

    // Assert
    assert_eq!(index.status(), 200);
    let content_type = index.header("Content-Type").unwrap();
    assert!(content_type.starts_with("text/html"));
    assert_eq!(index.header("Access-Control-Allow-Origin"), Some("*"));
    assert_eq!(index.header("Server"), Some("padlink"));
    assert_eq!(index.body, b"<h1>pad</h1>");
    // icon.svg was never written.
    assert_eq!(icon.status(), 404);
}

#[tokio::test]
async fn test_malformed_request_gets_400_and_close() {
    let www = tempfile::tempdir().unwrap();
    let server = TestServer::start(www.path()).await;
    let mut client = RawClient::connect(server.addr).await;

    let response = client.request(b"BROKEN\r\n\r\n").await;

    assert_eq!(response.status(), 400);
    assert!(client.at_eof().await);
}

#[tokio::test]
async fn test_raw_upgrade_then_oversized_frame_gets_close_reply() {
    // Arrange
    let www = tempfile::tempdir().unwrap();
    let server = TestServer::start_with(www.path(), 64).await;
    let mut client = RawClient::connect(server.addr).await;

    // Act: handshake
    let upgrade = client.request(UPGRADE).await;

    // Assert: handshake
    assert_eq!(upgrade.status(), 101);
    assert_eq!(
        upgrade.header("Sec-WebSocket-Accept"),
        Some(accept_key("dGhlIHNhbXBsZSBub25jZQ==").as_str())
    );

    // Act: header of a 200-byte frame; the payload is never sent.
    let wire = encode_frame(&Frame::text(vec![b'x'; 200]), Some([1, 2, 3, 4]));
    client.send(&wire[..4]).await;

    // Assert: close reply, then the server hangs up.
    assert_eq!(client.read_bytes(2).await, CLOSE_FRAME.to_vec());
    assert!(client.at_eof().await);
    assert!(server.events.is_empty());
    server.wait_for_idle().await;
}

#[tokio::test]
async fn test_upgrade_without_key_is_bad_request() {
    let www = tempfile::tempdir().unwrap();
    let server = TestServer::start(www.path()).await;
    let mut client = RawClient::connect(server.addr).await;

    let response = client
        .request(b"GET /ws HTTP/1.1\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n\r\n")
        .await;

    assert_eq!(response.status(), 400);
    assert!(client.at_eof().await);
}

#[tokio::test]
async fn test_shutdown_stops_accept_loop() {
    let www = tempfile::tempdir().unwrap();
    let server = TestServer::start(www.path()).await;

    let result = server.shutdown().await;

    assert!(result.is_ok());
}
