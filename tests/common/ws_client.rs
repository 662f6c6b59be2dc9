//! Live test server and WebSocket client plumbing
//!
//! Binds the full router on an ephemeral port and drives it with real
//! WebSocket clients, so the end-to-end suite exercises the same code
//! path production connections take, close codes included.

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use xfchat::routes::create_router;
use xfchat::server::AppState;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Serve the app on an ephemeral port, returning its address
pub async fn start_server(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no local addr");
    let app = create_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server failed");
    });
    addr
}

/// Connect carrying the credential as a `token` query parameter
pub async fn connect_query(addr: SocketAddr, conversation_id: i64, token: &str) -> WsStream {
    let url = format!("ws://{addr}/ws/chat/{conversation_id}?token={token}");
    let (stream, _) = connect_async(url).await.expect("handshake failed");
    stream
}

/// Connect carrying the credential as an `Authorization: Bearer` header
pub async fn connect_bearer(addr: SocketAddr, conversation_id: i64, token: &str) -> WsStream {
    let url = format!("ws://{addr}/ws/chat/{conversation_id}");
    let mut request = url.into_client_request().expect("bad request url");
    request.headers_mut().insert(
        "Authorization",
        format!("Bearer {token}").parse().expect("bad header value"),
    );
    let (stream, _) = connect_async(request).await.expect("handshake failed");
    stream
}

/// Connect with no credential at all
pub async fn connect_anonymous(addr: SocketAddr, conversation_id: i64) -> WsStream {
    let url = format!("ws://{addr}/ws/chat/{conversation_id}");
    let (stream, _) = connect_async(url).await.expect("handshake failed");
    stream
}

/// Send one JSON frame
pub async fn send_json(ws: &mut WsStream, value: Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("send failed");
}

/// Receive the next text frame as JSON, skipping transport frames
pub async fn recv_json(ws: &mut WsStream) -> Value {
    loop {
        let message = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed while waiting for a frame")
            .expect("transport error");
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).expect("frame is not valid JSON");
        }
    }
}

/// Receive frames until one matches `predicate`, skipping the rest
///
/// Presence frames from concurrent connects can interleave with the
/// frame a test is waiting for; this absorbs them.
pub async fn recv_json_matching(ws: &mut WsStream, predicate: impl Fn(&Value) -> bool) -> Value {
    loop {
        let frame = recv_json(ws).await;
        if predicate(&frame) {
            return frame;
        }
    }
}

/// Assert no text frame arrives within a short window
pub async fn assert_silent(ws: &mut WsStream) {
    match tokio::time::timeout(Duration::from_millis(300), ws.next()).await {
        Err(_) => {}
        Ok(Some(Ok(Message::Text(text)))) => {
            panic!("expected silence, got frame: {}", &*text);
        }
        Ok(_) => {}
    }
}

/// Read until the server's close frame, returning its code
pub async fn expect_close_code(ws: &mut WsStream) -> u16 {
    loop {
        let message = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for close")
            .expect("connection ended without a close frame")
            .expect("transport error");
        if let Message::Close(Some(frame)) = message {
            return u16::from(frame.code);
        }
    }
}

/// Initiate a clean close from the client side
pub async fn close(mut ws: WsStream) {
    let _ = ws.send(Message::Close(None)).await;
}
