//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! WebSocket transport implementation.
//!
//! Bot Framework channels reach streaming bots over a single WebSocket: the
//! channel host dials `.../api/messages` and upgrades, or the bot dials out
//! itself for a proactive connection. Frames of the streaming protocol travel
//! as binary WebSocket messages.
//!
//! # Examples
//!
//! ```rust,no_run
//! use botstream::transport::{
//!     TransportListener, WebSocketConfig, WebSocketListener, WebSocketTransport,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let listener = WebSocketListener::bind("127.0.0.1:3978", WebSocketConfig::default()).await?;
//! let address = listener.local_addr()?;
//!
//! let client = WebSocketTransport::connect(
//!     &format!("ws://{}/api/messages", address),
//!     WebSocketConfig::default(),
//! ).await?;
//! let server = listener.accept().await?;
//! # Ok(())
//! # }
//! ```

use crate::transport::{
    ShutdownFuture, Transport, TransportError, TransportId, TransportListener, TransportMetadata,
};
use futures_util::{Sink, Stream};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig as TungsteniteConfig;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, accept_async_with_config, connect_async_with_config,
};
use tracing::{debug, info};

/// Configuration for WebSocket transport.
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// Maximum size of a single WebSocket frame (default: 16 MB)
    pub max_frame_size: usize,

    /// Maximum size of a complete message (default: 64 MB)
    pub max_message_size: usize,

    /// Time allowed for the TCP connect and upgrade handshake (default: 30s)
    pub connect_timeout: Duration,

    /// Accept unmasked frames (server-side only, default: false)
    ///
    /// RFC 6455 requires clients to mask frames. This is primarily for testing.
    pub accept_unmasked_frames: bool,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_frame_size: 16 * 1024 * 1024,   // 16 MB
            max_message_size: 64 * 1024 * 1024, // 64 MB
            connect_timeout: Duration::from_secs(30),
            accept_unmasked_frames: false,
        }
    }
}

impl WebSocketConfig {
    /// Sets the maximum frame size.
    pub fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Sets the maximum message size.
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn to_tungstenite(&self) -> TungsteniteConfig {
        let mut config = TungsteniteConfig::default();
        config.max_frame_size = Some(self.max_frame_size);
        config.max_message_size = Some(self.max_message_size);
        config.accept_unmasked_frames = self.accept_unmasked_frames;
        config
    }
}

/// WebSocket transport implementation.
///
/// Reads drain binary (and text) messages into a byte stream; ping/pong and
/// close handshakes are handled by the WebSocket layer. A close frame reads as
/// end-of-stream.
pub struct WebSocketTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    config: WebSocketConfig,
    metadata: TransportMetadata,
    read_buffer: Vec<u8>,
    read_pos: usize,
}

impl WebSocketTransport {
    /// Connect to a WebSocket server.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails, or the
    /// handshake does not complete within the configured timeout.
    pub async fn connect(url: &str, config: WebSocketConfig) -> Result<Self, TransportError> {
        let (ws_stream, _) = tokio::time::timeout(
            config.connect_timeout,
            connect_async_with_config(url, Some(config.to_tungstenite()), true),
        )
        .await
        .map_err(|_| TransportError::Timeout {
            duration: config.connect_timeout,
        })?
        .map_err(TransportError::WebSocket)?;

        let transport = Self::from_websocket(ws_stream, config);
        info!(transport_id = %transport.metadata.id, url, "WebSocket connected");
        Ok(transport)
    }

    /// Performs the server side of the handshake on an accepted TCP stream.
    pub async fn accept(stream: TcpStream, config: WebSocketConfig) -> Result<Self, TransportError> {
        let ws_stream = accept_async_with_config(
            MaybeTlsStream::Plain(stream),
            Some(config.to_tungstenite()),
        )
        .await
        .map_err(TransportError::WebSocket)?;

        Ok(Self::from_websocket(ws_stream, config))
    }

    fn from_websocket(
        stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
        config: WebSocketConfig,
    ) -> Self {
        // Only the plain variant exposes socket addresses
        let (local_addr, peer_addr) = match stream.get_ref() {
            MaybeTlsStream::Plain(tcp) => (tcp.local_addr().ok(), tcp.peer_addr().ok()),
            _ => (None, None),
        };

        let mut metadata = TransportMetadata::new(TransportId::next(), "websocket");
        if let Some(addr) = local_addr {
            metadata = metadata.with_local_addr(addr.to_string());
        }
        if let Some(addr) = peer_addr {
            metadata = metadata.with_peer_addr(addr.to_string());
        }

        Self {
            stream,
            config,
            metadata,
            read_buffer: Vec::new(),
            read_pos: 0,
        }
    }

    /// Get the WebSocket configuration.
    pub fn config(&self) -> &WebSocketConfig {
        &self.config
    }
}

fn to_io_error(error: WsError) -> io::Error {
    match error {
        WsError::Io(e) => e,
        WsError::ConnectionClosed | WsError::AlreadyClosed => {
            io::Error::new(io::ErrorKind::BrokenPipe, "websocket closed")
        }
        other => io::Error::other(other),
    }
}

impl Transport for WebSocketTransport {
    fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }

    fn shutdown(&mut self) -> ShutdownFuture<'_> {
        Box::pin(async move {
            debug!(transport_id = %self.metadata.id, "Closing WebSocket");
            match self.stream.close(None).await {
                Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => Ok(()),
                Err(e) => Err(TransportError::WebSocket(e)),
            }
        })
    }
}

impl AsyncRead for WebSocketTransport {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        loop {
            if this.read_pos < this.read_buffer.len() {
                let remaining = &this.read_buffer[this.read_pos..];
                let to_copy = remaining.len().min(buf.remaining());
                buf.put_slice(&remaining[..to_copy]);
                this.read_pos += to_copy;
                if this.read_pos >= this.read_buffer.len() {
                    this.read_buffer.clear();
                    this.read_pos = 0;
                }
                return Poll::Ready(Ok(()));
            }

            match ready!(Pin::new(&mut this.stream).poll_next(cx)) {
                Some(Ok(Message::Binary(data))) => {
                    this.read_buffer = data;
                    this.read_pos = 0;
                }
                Some(Ok(Message::Text(text))) => {
                    this.read_buffer = text.into_bytes();
                    this.read_pos = 0;
                }
                Some(Ok(Message::Close(_))) | None => return Poll::Ready(Ok(())),
                Some(Ok(_)) => continue,
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => {
                    return Poll::Ready(Ok(()));
                }
                Some(Err(e)) => return Poll::Ready(Err(to_io_error(e))),
            }
        }
    }
}

impl AsyncWrite for WebSocketTransport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let mut stream = Pin::new(&mut this.stream);

        ready!(stream.as_mut().poll_ready(cx)).map_err(to_io_error)?;
        stream
            .start_send(Message::Binary(buf.to_vec()))
            .map_err(to_io_error)?;
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().stream)
            .poll_flush(cx)
            .map_err(to_io_error)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match ready!(Pin::new(&mut self.get_mut().stream).poll_close(cx)) {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Poll::Ready(Ok(())),
            Err(e) => Poll::Ready(Err(to_io_error(e))),
        }
    }
}

/// WebSocket listener for accepting incoming connections.
pub struct WebSocketListener {
    listener: TcpListener,
    config: WebSocketConfig,
}

impl WebSocketListener {
    /// Bind to a local address and listen for WebSocket connections.
    ///
    /// # Errors
    ///
    /// Returns an error if binding fails (e.g., address already in use).
    pub async fn bind(
        addr: impl Into<String>,
        config: WebSocketConfig,
    ) -> Result<Self, TransportError> {
        let addr_str = addr.into();
        let listener =
            TcpListener::bind(&addr_str)
                .await
                .map_err(|e| TransportError::BindFailed {
                    address: addr_str,
                    source: e,
                })?;

        Ok(Self { listener, config })
    }
}

#[async_trait::async_trait]
impl TransportListener for WebSocketListener {
    type Transport = WebSocketTransport;

    async fn accept(&self) -> Result<WebSocketTransport, TransportError> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(|e| TransportError::Io { source: e })?;
        debug!(%peer, "Accepted TCP connection, upgrading to WebSocket");

        WebSocketTransport::accept(stream, self.config.clone()).await
    }

    fn local_addr(&self) -> Result<String, TransportError> {
        self.listener
            .local_addr()
            .map(|addr| addr.to_string())
            .map_err(|e| TransportError::Io { source: e })
    }
}
