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

//! In-memory transport implementation.
//!
//! This module provides a transport backed by Tokio channels. It lets two
//! streaming connections talk to each other inside one process, which is how
//! most of the crate's own tests drive a request handler end to end.

use crate::transport::{ShutdownFuture, Transport, TransportId, TransportMetadata};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

/// Default buffer size for memory transport channels.
const DEFAULT_BUFFER_SIZE: usize = 1024;

/// In-memory transport implementation.
///
/// Data written to one end of a pair can be read from the other. Shutting an
/// end down (or dropping it) makes the peer's reads return end-of-stream,
/// which a streaming connection reports as a disconnect.
///
/// # Examples
///
/// ```rust
/// use botstream::transport::MemoryTransport;
/// use tokio::io::{AsyncReadExt, AsyncWriteExt};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (mut client, mut server) = MemoryTransport::pair(16);
///
/// client.write_all(b"Hello!").await?;
///
/// let mut buffer = vec![0u8; 6];
/// server.read_exact(&mut buffer).await?;
/// assert_eq!(&buffer, b"Hello!");
/// # Ok(())
/// # }
/// ```
pub struct MemoryTransport {
    metadata: TransportMetadata,
    reader: MemoryReader,
    writer: MemoryWriter,
}

/// Reader half of a memory transport.
struct MemoryReader {
    rx: mpsc::Receiver<Vec<u8>>,
    current_chunk: Option<Vec<u8>>,
    chunk_offset: usize,
}

/// Writer half of a memory transport. `None` once shut down.
struct MemoryWriter {
    tx: Option<mpsc::Sender<Vec<u8>>>,
}

impl MemoryReader {
    fn new(rx: mpsc::Receiver<Vec<u8>>) -> Self {
        Self {
            rx,
            current_chunk: None,
            chunk_offset: 0,
        }
    }
}

impl MemoryTransport {
    /// Creates a pair of connected memory transports.
    ///
    /// `buffer_size` is the number of writes that may be queued in each
    /// direction before further writes wait for the reader.
    pub fn pair(buffer_size: usize) -> (Self, Self) {
        let (tx1, rx1) = mpsc::channel(buffer_size.max(1));
        let (tx2, rx2) = mpsc::channel(buffer_size.max(1));

        let id1 = TransportId::next();
        let id2 = TransportId::next();
        debug!(transport1_id = %id1, transport2_id = %id2, "Created memory transport pair");

        let transport1 = Self {
            metadata: TransportMetadata::new(id1, "memory").with_peer_addr(id2.to_string()),
            reader: MemoryReader::new(rx2),
            writer: MemoryWriter { tx: Some(tx1) },
        };

        let transport2 = Self {
            metadata: TransportMetadata::new(id2, "memory").with_peer_addr(id1.to_string()),
            reader: MemoryReader::new(rx1),
            writer: MemoryWriter { tx: Some(tx2) },
        };

        (transport1, transport2)
    }

    /// Creates a pair of connected memory transports with default buffer size.
    pub fn pair_default() -> (Self, Self) {
        Self::pair(DEFAULT_BUFFER_SIZE)
    }
}

impl Transport for MemoryTransport {
    fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }

    fn shutdown(&mut self) -> ShutdownFuture<'_> {
        Box::pin(async move {
            debug!(transport_id = %self.metadata.id, "Shutting down memory transport");
            self.writer.tx = None;
            Ok(())
        })
    }
}

impl AsyncRead for MemoryTransport {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let reader = &mut self.reader;

        if let Some(chunk) = &reader.current_chunk {
            let remaining = &chunk[reader.chunk_offset..];
            let to_read = remaining.len().min(buf.remaining());
            buf.put_slice(&remaining[..to_read]);
            reader.chunk_offset += to_read;

            if reader.chunk_offset >= chunk.len() {
                reader.current_chunk = None;
                reader.chunk_offset = 0;
            }
            return Poll::Ready(Ok(()));
        }

        match reader.rx.poll_recv(cx) {
            Poll::Ready(Some(chunk)) => {
                let to_read = chunk.len().min(buf.remaining());
                buf.put_slice(&chunk[..to_read]);

                // Keep the tail for the next read
                if to_read < chunk.len() {
                    reader.current_chunk = Some(chunk);
                    reader.chunk_offset = to_read;
                }

                Poll::Ready(Ok(()))
            }
            // Channel closed, EOF
            Poll::Ready(None) => Poll::Ready(Ok(())),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl AsyncWrite for MemoryTransport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let Some(tx) = &this.writer.tx else {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "memory transport shut down",
            )));
        };

        match tx.try_send(buf.to_vec()) {
            Ok(()) => Poll::Ready(Ok(buf.len())),
            Err(TrySendError::Full(_)) => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Err(TrySendError::Closed(_)) => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "memory transport closed",
            ))),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.get_mut().writer.tx = None;
        Poll::Ready(Ok(()))
    }
}
