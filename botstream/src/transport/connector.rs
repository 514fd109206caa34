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

//! Outbound connection establishment.
//!
//! When a proactive message targets a conversation no live connection owns,
//! the adapter dials the channel itself. The [`TransportConnector`] trait hides
//! how that dial happens so tests can hand out in-memory transports.

use crate::transport::{Transport, TransportError};
use async_trait::async_trait;

/// Opens outbound transports to a URL.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use botstream::transport::{MemoryTransport, Transport, TransportConnector, TransportError};
///
/// struct Loopback;
///
/// #[async_trait]
/// impl TransportConnector for Loopback {
///     async fn connect(&self, _url: &str) -> Result<Box<dyn Transport>, TransportError> {
///         let (local, _remote) = MemoryTransport::pair_default();
///         Ok(Box::new(local))
///     }
/// }
/// ```
#[async_trait]
pub trait TransportConnector: Send + Sync + 'static {
    /// Opens a new duplex transport to `url`.
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, TransportError>;
}

/// Connector dialing `ws://` and `wss://` URLs.
#[cfg(feature = "websocket")]
#[derive(Debug, Clone, Default)]
pub struct WebSocketConnector {
    config: crate::transport::WebSocketConfig,
}

#[cfg(feature = "websocket")]
impl WebSocketConnector {
    /// Creates a connector using the given WebSocket settings.
    pub fn new(config: crate::transport::WebSocketConfig) -> Self {
        Self { config }
    }
}

#[cfg(feature = "websocket")]
#[async_trait]
impl TransportConnector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, TransportError> {
        let transport =
            crate::transport::WebSocketTransport::connect(url, self.config.clone()).await?;
        Ok(Box::new(transport))
    }
}
