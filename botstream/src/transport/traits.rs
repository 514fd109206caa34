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

use crate::transport::{TransportError, TransportMetadata};
use std::future::Future;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncWrite};

/// Future returned by [`Transport::shutdown`].
pub type ShutdownFuture<'a> = Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + 'a>>;

/// Core transport abstraction for duplex byte streams.
///
/// A streaming connection only needs an ordered, reliable byte stream in each
/// direction. WebSockets, named pipes and in-memory channels all provide that
/// through this trait, which extends Tokio's `AsyncRead` and `AsyncWrite` with
/// metadata and a graceful shutdown.
///
/// # Examples
///
/// ```rust
/// use botstream::transport::{MemoryTransport, Transport};
///
/// fn describe<T: Transport>(transport: &T) -> String {
///     format!("{} via {}", transport.metadata().id, transport.metadata().transport_type)
/// }
///
/// let (client, _server) = MemoryTransport::pair_default();
/// assert!(describe(&client).ends_with("via memory"));
/// ```
pub trait Transport: AsyncRead + AsyncWrite + Send + Sync + Unpin + 'static {
    /// Returns metadata about this transport.
    fn metadata(&self) -> &TransportMetadata;

    /// Gracefully shuts down the transport.
    ///
    /// After calling `shutdown()` the peer observes end-of-stream and the
    /// transport should not be used for further I/O.
    fn shutdown(&mut self) -> ShutdownFuture<'_>;

    /// Splits the transport into separate read and write halves.
    ///
    /// A streaming connection reads frames on one task while any number of
    /// tasks write responses and outbound requests through the other half.
    fn split(
        self,
    ) -> (
        Box<dyn AsyncRead + Send + Unpin>,
        Box<dyn AsyncWrite + Send + Unpin>,
    )
    where
        Self: Sized,
    {
        let (reader, writer) = tokio::io::split(self);
        (Box::new(reader), Box::new(writer))
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn metadata(&self) -> &TransportMetadata {
        (**self).metadata()
    }

    fn shutdown(&mut self) -> ShutdownFuture<'_> {
        (**self).shutdown()
    }
}

/// Trait for transport listeners (servers).
///
/// A listener accepts incoming duplex connections, e.g. clients opening a named
/// pipe or a channel host dialing into a WebSocket endpoint.
#[async_trait::async_trait]
pub trait TransportListener: Send + Sync {
    /// The type of transport this listener produces
    type Transport: Transport;

    /// Accepts a new incoming connection.
    async fn accept(&self) -> Result<Self::Transport, TransportError>;

    /// Returns the local address or pipe path this listener is bound to.
    #[allow(clippy::result_large_err)]
    fn local_addr(&self) -> Result<String, TransportError>;
}
