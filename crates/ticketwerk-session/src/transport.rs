// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transport abstraction and the WebSocket implementation.
//
// The connection manager only needs three things from a transport: open a
// link, read text frames until the peer goes away, and write text frames.
// Keeping that behind a trait lets the state machine run against an
// in-memory link in tests.

use std::future::Future;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, instrument};

use ticketwerk_core::config::ClientConfig;
use ticketwerk_core::error::{Result, TicketError};

/// Opens links to the print service.
pub trait Connector: Send + Sync + 'static {
    type Writer: LinkWriter;
    type Reader: LinkReader;

    /// Establish a new link.  Resolves once the link is open.
    fn connect(&self) -> impl Future<Output = Result<(Self::Writer, Self::Reader)>> + Send;
}

/// Receiving half of an open link.
pub trait LinkReader: Send + 'static {
    /// Next text frame, or `None` once the peer has closed the link.
    ///
    /// Must be cancel safe: the manager polls it inside `select!`.
    fn next_text(&mut self) -> impl Future<Output = Option<Result<String>>> + Send;
}

/// Sending half of an open link.
pub trait LinkWriter: Send + 'static {
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<()>> + Send;

    /// Best-effort close; errors are irrelevant because the link is going
    /// away either way.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

// ---------------------------------------------------------------------------
// WebSocket
// ---------------------------------------------------------------------------

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects to `ws://<host>:<port>/ws`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
    auth_token: Option<String>,
}

impl WsConnector {
    pub fn new(url: impl Into<String>, auth_token: Option<String>) -> Self {
        Self {
            url: url.into(),
            auth_token,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.ws_url(), config.auth_token.clone())
    }
}

impl Connector for WsConnector {
    type Writer = WsWriter;
    type Reader = WsReader;

    #[instrument(skip(self), fields(url = %self.url))]
    async fn connect(&self) -> Result<(WsWriter, WsReader)> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| TicketError::Transport(format!("bad endpoint {}: {e}", self.url)))?;

        // The token travels as a bearer credential on the upgrade request.
        if let Some(token) = &self.auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| TicketError::Config(format!("auth token: {e}")))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (stream, response) = connect_async(request)
            .await
            .map_err(|e| TicketError::Transport(format!("connect {}: {e}", self.url)))?;
        info!(status = %response.status(), "websocket handshake complete");

        let (sink, stream) = stream.split();
        Ok((WsWriter { sink }, WsReader { stream }))
    }
}

pub struct WsReader {
    stream: SplitStream<WsStream>,
}

impl LinkReader for WsReader {
    async fn next_text(&mut self) -> Option<Result<String>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => {
                    return Some(Ok(String::from_utf8_lossy(&bytes).into_owned()));
                }
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "close frame received");
                    return None;
                }
                // Ping/pong are answered by tungstenite itself.
                Ok(_) => continue,
                Err(e) => return Some(Err(TicketError::Transport(e.to_string()))),
            }
        }
    }
}

pub struct WsWriter {
    sink: SplitSink<WsStream, Message>,
}

impl LinkWriter for WsWriter {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.sink
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| TicketError::Transport(format!("send: {e}")))
    }

    async fn close(&mut self) {
        if let Err(e) = self.sink.close().await {
            debug!(error = %e, "websocket close");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_hdr_async;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

    /// One-shot echo server that records the Authorization header.
    async fn echo_server() -> (String, Arc<Mutex<Option<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let seen = Arc::new(Mutex::new(None));
        let seen_in_server = Arc::clone(&seen);

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.expect("accept");
            let callback = move |req: &Request, resp: Response| -> std::result::Result<Response, ErrorResponse> {
                let auth = req
                    .headers()
                    .get(AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned);
                *seen_in_server.lock().expect("lock") = auth;
                Ok(resp)
            };
            let mut ws = accept_hdr_async(tcp, callback).await.expect("handshake");
            ws.send(Message::Text(r#"{"tipo":"info","mensaje":"hola"}"#.into()))
                .await
                .expect("welcome");
            while let Some(Ok(msg)) = ws.next().await {
                if msg.is_text() {
                    ws.send(msg).await.expect("echo");
                }
            }
        });

        (format!("ws://{addr}/ws"), seen)
    }

    #[tokio::test]
    async fn connects_sends_and_receives() {
        let (url, seen) = echo_server().await;
        let connector = WsConnector::new(url, Some("tok-123".into()));
        let (mut writer, mut reader) = connector.connect().await.expect("connect");

        let welcome = reader.next_text().await.expect("frame").expect("ok");
        assert!(welcome.contains("hola"));

        writer.send_text(r#"{"tipo":"status"}"#.into()).await.expect("send");
        let echoed = reader.next_text().await.expect("frame").expect("ok");
        assert_eq!(echoed, r#"{"tipo":"status"}"#);

        assert_eq!(seen.lock().expect("lock").as_deref(), Some("Bearer tok-123"));
        writer.close().await;
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let connector = WsConnector::new(format!("ws://{addr}/ws"), None);
        match connector.connect().await {
            Err(TicketError::Transport(_)) => {}
            Err(other) => panic!("expected transport error, got {other:?}"),
            Ok(_) => panic!("expected transport error, got a link"),
        }
    }
}
