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

use crate::StreamingError;
use crate::observability::StreamingMetrics;
use crate::protocol::{
    HEADER_LENGTH, Header, MAX_HEADER_PAYLOAD_LENGTH, PayloadType, ProtocolError,
    StreamingRequest, StreamingResponse,
};
use crate::session::assembler::{Assembled, FrameAssembler};
use crate::session::writer::FrameWriter;
use crate::session::{ConnectionConfig, PendingRequests, RequestHandler};
use crate::transport::{Transport, TransportError, TransportId, TransportMetadata};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

type ResponseResult = Result<StreamingResponse, TransportError>;

/// A framed, bidirectional request/response session over one transport.
///
/// Either side may send requests at any time. Inbound requests go to the
/// [`RequestHandler`] passed to [`listen`](Self::listen); inbound responses
/// are matched to the outbound request with the same id.
///
/// # Lifecycle
///
/// A connection starts connected. It becomes disconnected exactly once, when
/// the peer closes the stream, a read fails, the listen token is cancelled or
/// [`disconnect`](Self::disconnect) is called. From then on outbound requests
/// fail immediately and every request still awaiting a response completes
/// with [`TransportError::ConnectionLost`].
///
/// # Examples
///
/// ```rust
/// use botstream::protocol::{StreamingRequest, StreamingResponse};
/// use botstream::session::{ConnectionConfig, RequestHandler, StreamingConnection};
/// use botstream::transport::MemoryTransport;
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// struct Ok200;
///
/// #[async_trait::async_trait]
/// impl RequestHandler for Ok200 {
///     async fn process_request(&self, _: StreamingRequest, _: CancellationToken) -> StreamingResponse {
///         StreamingResponse::ok()
///     }
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (a, b) = MemoryTransport::pair_default();
/// let server = Arc::new(StreamingConnection::new(a, ConnectionConfig::default()));
/// let client = Arc::new(StreamingConnection::new(b, ConnectionConfig::default()));
///
/// let cancel = CancellationToken::new();
/// let listener = Arc::clone(&server);
/// let token = cancel.clone();
/// tokio::spawn(async move { listener.listen(Arc::new(Ok200), token).await });
/// let receiver = Arc::clone(&client);
/// let token = cancel.clone();
/// tokio::spawn(async move { receiver.listen(Arc::new(Ok200), token).await });
///
/// let response = client
///     .send_request(&StreamingRequest::create_get("/api/version"), CancellationToken::new())
///     .await?;
/// assert_eq!(response.status_code, 200);
/// # Ok(())
/// # }
/// ```
pub struct StreamingConnection {
    metadata: TransportMetadata,
    config: ConnectionConfig,
    writer: Arc<FrameWriter>,
    reader: parking_lot::Mutex<Option<Box<dyn AsyncRead + Send + Unpin>>>,
    pending: PendingRequests<ResponseResult>,
    disconnected: CancellationToken,
    closed: AtomicBool,
    metrics: Arc<StreamingMetrics>,
}

impl StreamingConnection {
    /// Wraps a transport in a streaming session.
    pub fn new<T: Transport>(transport: T, config: ConnectionConfig) -> Self {
        Self::with_metrics(transport, config, Arc::new(StreamingMetrics::new()))
    }

    /// Wraps a transport, recording into shared metrics.
    pub fn with_metrics<T: Transport>(
        transport: T,
        config: ConnectionConfig,
        metrics: Arc<StreamingMetrics>,
    ) -> Self {
        let metadata = transport.metadata().clone();
        let (reader, writer) = transport.split();
        let chunk_size = config.max_chunk_size.clamp(1, MAX_HEADER_PAYLOAD_LENGTH);

        metrics.record_connection_opened();
        debug!(
            transport_id = %metadata.id,
            transport_type = %metadata.transport_type,
            peer_addr = ?metadata.peer_addr,
            "Opened streaming connection"
        );

        Self {
            writer: Arc::new(FrameWriter::new(writer, chunk_size, metadata.id)),
            reader: parking_lot::Mutex::new(Some(reader)),
            pending: PendingRequests::new(),
            disconnected: CancellationToken::new(),
            closed: AtomicBool::new(false),
            metadata,
            config,
            metrics,
        }
    }

    /// Returns the id of the underlying transport.
    pub fn id(&self) -> TransportId {
        self.metadata.id
    }

    /// Returns metadata of the underlying transport.
    pub fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }

    /// Returns the metrics this connection records into.
    pub fn metrics(&self) -> &Arc<StreamingMetrics> {
        &self.metrics
    }

    /// Returns `true` until the connection has disconnected.
    pub fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    /// Returns a token that is cancelled when the connection disconnects.
    pub fn disconnected(&self) -> CancellationToken {
        self.disconnected.clone()
    }

    /// Reads frames until the connection ends, dispatching requests to
    /// `handler`.
    ///
    /// Returns `Ok(())` when the peer closes the stream or `cancel` fires.
    /// A connection can only be listened on once.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is already listening, a read fails,
    /// or the peer sends a frame header that cannot be decoded. The connection
    /// is disconnected in every case.
    pub async fn listen(
        &self,
        handler: Arc<dyn RequestHandler>,
        cancel: CancellationToken,
    ) -> Result<(), StreamingError> {
        let mut reader = self.reader.lock().take().ok_or_else(|| {
            TransportError::InvalidConfiguration {
                reason: "connection is already listening".to_string(),
            }
        })?;

        info!(transport_id = %self.metadata.id, "Listening for frames");

        let requests = CancellationToken::new();
        let mut assembler = FrameAssembler::new(self.config.max_message_size);

        let (result, reason) = loop {
            let frame = tokio::select! {
                _ = cancel.cancelled() => break (Ok(()), "listen cancelled"),
                _ = self.disconnected.cancelled() => break (Ok(()), "disconnected locally"),
                frame = read_frame(&mut reader) => frame,
            };

            let (header, payload) = match frame {
                Ok(Some(frame)) => frame,
                Ok(None) => break (Ok(()), "peer closed the stream"),
                Err(error) => break (Err(error), "read failed"),
            };

            let (payload_type, id) = (header.payload_type, header.id);
            match assembler.accept(header, payload) {
                Ok(Some(Assembled::Request(id, request))) => {
                    self.dispatch(id, request, &handler, &requests);
                }
                Ok(Some(Assembled::Response(id, response))) => {
                    if !self.pending.complete(id, Ok(response)).await {
                        debug!(
                            transport_id = %self.metadata.id,
                            request_id = %id,
                            "Dropping response with no waiting request"
                        );
                    }
                }
                Ok(None) => {}
                Err(error) => {
                    self.metrics.record_frame_error();
                    warn!(
                        transport_id = %self.metadata.id,
                        id = %id,
                        error = %error,
                        "Discarding malformed message"
                    );
                    if payload_type == PayloadType::Request {
                        self.reply_bad_request(id).await;
                    }
                }
            }
        };

        if let Err(error) = &result {
            warn!(transport_id = %self.metadata.id, error = %error, "Listen loop failed");
        }
        requests.cancel();
        self.close(reason).await;
        result
    }

    /// Sends a request and waits for the matching response.
    ///
    /// # Errors
    ///
    /// - [`TransportError::NotConnected`] if the connection has disconnected
    /// - [`TransportError::ConnectionLost`] if it disconnects while waiting
    /// - [`TransportError::Timeout`] if no response arrives within the
    ///   configured request timeout
    /// - [`StreamingError::Cancelled`] if `cancel` fires first, after which
    ///   the peer is told to abandon the request
    pub async fn send_request(
        &self,
        request: &StreamingRequest,
        cancel: CancellationToken,
    ) -> Result<StreamingResponse, StreamingError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected.into());
        }

        let id = Uuid::new_v4();
        let rx = self.pending.register(id).await;
        if !self.is_connected() {
            self.pending.cancel(id).await;
            return Err(TransportError::NotConnected.into());
        }

        if let Err(error) = self.writer.send_request(id, request).await {
            self.pending.cancel(id).await;
            return Err(error.into());
        }
        debug!(
            transport_id = %self.metadata.id,
            request_id = %id,
            verb = %request.verb,
            path = %request.path,
            "Sent request"
        );

        let timeout = self.config.request_timeout;
        tokio::select! {
            biased;
            result = tokio::time::timeout(timeout, rx) => match result {
                Ok(Ok(Ok(response))) => Ok(response),
                Ok(Ok(Err(error))) => Err(error.into()),
                Ok(Err(_)) => Err(TransportError::connection_lost("response was abandoned").into()),
                Err(_) => {
                    self.pending.cancel(id).await;
                    Err(TransportError::Timeout { duration: timeout }.into())
                }
            },
            _ = cancel.cancelled() => {
                self.pending.cancel(id).await;
                if let Err(error) = self.writer.send_cancel_all(id).await {
                    debug!(transport_id = %self.metadata.id, error = %error, "Failed to send cancel");
                }
                Err(StreamingError::Cancelled)
            }
            _ = self.disconnected.cancelled() => {
                self.pending.cancel(id).await;
                Err(TransportError::connection_lost("connection closed while awaiting response").into())
            }
        }
    }

    /// Disconnects the connection.
    ///
    /// Outstanding requests fail with [`TransportError::ConnectionLost`] and a
    /// running [`listen`](Self::listen) returns. Calling this more than once
    /// has no further effect.
    pub async fn disconnect(&self) {
        self.close("disconnected locally").await;
    }

    fn dispatch(
        &self,
        id: Uuid,
        request: StreamingRequest,
        handler: &Arc<dyn RequestHandler>,
        requests: &CancellationToken,
    ) {
        self.metrics.record_request_received();
        debug!(
            transport_id = %self.metadata.id,
            request_id = %id,
            verb = %request.verb,
            path = %request.path,
            "Received request"
        );

        let handler = Arc::clone(handler);
        let writer = Arc::clone(&self.writer);
        let metrics = Arc::clone(&self.metrics);
        let cancel = requests.child_token();
        let transport_id = self.metadata.id;
        tokio::spawn(async move {
            let response = handler.process_request(request, cancel).await;
            metrics.record_response_status(response.status_code);
            if let Err(error) = writer.send_response(id, &response).await {
                warn!(
                    transport_id = %transport_id,
                    request_id = %id,
                    error = %error,
                    "Failed to send response"
                );
            }
        });
    }

    async fn reply_bad_request(&self, id: Uuid) {
        self.metrics.record_response_status(400);
        let response = StreamingResponse::bad_request();
        if let Err(error) = self.writer.send_response(id, &response).await {
            warn!(transport_id = %self.metadata.id, request_id = %id, error = %error, "Failed to reject request");
        }
    }

    async fn close(&self, reason: &str) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.disconnected.cancel();

        for tx in self.pending.drain().await {
            let _ = tx.send(Err(TransportError::connection_lost(reason)));
        }
        if self.config.shutdown_on_close {
            if let Err(error) = self.writer.shutdown().await {
                debug!(transport_id = %self.metadata.id, error = %error, "Transport shutdown failed");
            }
        }

        self.metrics.record_connection_closed();
        info!(transport_id = %self.metadata.id, reason = reason, "Streaming connection closed");
    }
}

impl std::fmt::Debug for StreamingConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingConnection")
            .field("metadata", &self.metadata)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

/// Reads one frame. `Ok(None)` means the peer closed between frames.
async fn read_frame(
    reader: &mut (dyn AsyncRead + Send + Unpin),
) -> Result<Option<(Header, Vec<u8>)>, StreamingError> {
    let mut bytes = [0u8; HEADER_LENGTH];
    match reader.read_exact(&mut bytes).await {
        Ok(_) => {}
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(source) => return Err(TransportError::ReadFailed { source }.into()),
    }

    let header = Header::decode(&bytes)?;
    let mut payload = vec![0u8; header.payload_length];
    reader.read_exact(&mut payload).await.map_err(|source| {
        if source.kind() == io::ErrorKind::UnexpectedEof {
            StreamingError::Protocol(ProtocolError::invalid_header(
                "stream ended inside a frame payload",
            ))
        } else {
            TransportError::ReadFailed { source }.into()
        }
    })?;
    Ok(Some((header, payload)))
}
