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

//! Serialized frame output for one connection.

use crate::protocol::{
    ContentStream, Header, PayloadType, ProtocolError, RequestPayload, ResponsePayload,
    StreamDescription, StreamingRequest, StreamingResponse,
};
use crate::transport::{TransportError, TransportId};
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::trace;
use uuid::Uuid;

/// Writes frames to the write half of a transport.
///
/// Every frame is written under one lock acquisition, so frames from
/// concurrent senders never interleave mid-frame. Frames of different
/// messages may interleave with each other.
pub(crate) struct FrameWriter {
    writer: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
    max_chunk_size: usize,
    transport_id: TransportId,
}

impl FrameWriter {
    pub(crate) fn new(
        writer: Box<dyn AsyncWrite + Send + Unpin>,
        max_chunk_size: usize,
        transport_id: TransportId,
    ) -> Self {
        Self {
            writer: Mutex::new(writer),
            max_chunk_size,
            transport_id,
        }
    }

    /// Sends a request envelope followed by its streams.
    pub(crate) async fn send_request(
        &self,
        id: Uuid,
        request: &StreamingRequest,
    ) -> Result<(), TransportError> {
        let envelope = RequestPayload {
            verb: request.verb.clone(),
            path: request.path.clone(),
            streams: describe(&request.streams),
        };
        let bytes = serde_json::to_vec(&envelope).map_err(invalid_data)?;
        self.write_chunked(PayloadType::Request, id, &bytes).await?;
        self.write_streams(&request.streams).await
    }

    /// Sends a response envelope followed by its streams.
    pub(crate) async fn send_response(
        &self,
        id: Uuid,
        response: &StreamingResponse,
    ) -> Result<(), TransportError> {
        let envelope = ResponsePayload {
            status_code: response.status_code,
            streams: describe(&response.streams),
        };
        let bytes = serde_json::to_vec(&envelope).map_err(invalid_data)?;
        self.write_chunked(PayloadType::Response, id, &bytes).await?;
        self.write_streams(&response.streams).await
    }

    /// Tells the peer to abandon everything it holds for `id`.
    pub(crate) async fn send_cancel_all(&self, id: Uuid) -> Result<(), TransportError> {
        let header = Header::new(PayloadType::CancelAll, 0, id, true);
        self.write_frame(header, &[]).await
    }

    /// Shuts down the write half so the peer observes end-of-stream.
    pub(crate) async fn shutdown(&self) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        writer
            .shutdown()
            .await
            .map_err(|source| TransportError::WriteFailed { source })
    }

    async fn write_streams(&self, streams: &[ContentStream]) -> Result<(), TransportError> {
        for stream in streams {
            self.write_chunked(PayloadType::Stream, stream.id, &stream.data)
                .await?;
        }
        Ok(())
    }

    async fn write_chunked(
        &self,
        payload_type: PayloadType,
        id: Uuid,
        bytes: &[u8],
    ) -> Result<(), TransportError> {
        if bytes.is_empty() {
            let header = Header::new(payload_type, 0, id, true);
            return self.write_frame(header, &[]).await;
        }

        let mut chunks = bytes.chunks(self.max_chunk_size).peekable();
        while let Some(chunk) = chunks.next() {
            let end = chunks.peek().is_none();
            let header = Header::new(payload_type, chunk.len(), id, end);
            self.write_frame(header, chunk).await?;
        }
        Ok(())
    }

    async fn write_frame(&self, header: Header, payload: &[u8]) -> Result<(), TransportError> {
        let encoded = header.encode().map_err(invalid_data)?;

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&encoded)
            .await
            .map_err(|source| TransportError::WriteFailed { source })?;
        if !payload.is_empty() {
            writer
                .write_all(payload)
                .await
                .map_err(|source| TransportError::WriteFailed { source })?;
        }
        writer
            .flush()
            .await
            .map_err(|source| TransportError::WriteFailed { source })?;

        trace!(
            transport_id = %self.transport_id,
            payload_type = %header.payload_type,
            id = %header.id,
            length = header.payload_length,
            end = header.end,
            "Wrote frame"
        );
        Ok(())
    }
}

fn describe(streams: &[ContentStream]) -> Vec<StreamDescription> {
    streams
        .iter()
        .map(|stream| StreamDescription {
            id: stream.id,
            content_type: stream.content_type.clone(),
            length: Some(stream.len()),
        })
        .collect()
}

fn invalid_data(error: impl Into<ProtocolError>) -> TransportError {
    TransportError::WriteFailed {
        source: io::Error::new(io::ErrorKind::InvalidData, error.into()),
    }
}
