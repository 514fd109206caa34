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

use crate::session::ConnectionConfig;
use crate::transport::TransportConnector;
use std::fmt;
use std::sync::Arc;

/// Configuration for a [`StreamingAdapter`](crate::adapter::StreamingAdapter).
///
/// # Examples
///
/// ```rust
/// use botstream::adapter::AdapterConfig;
/// use botstream::session::ConnectionConfig;
/// use std::time::Duration;
///
/// let config = AdapterConfig::new()
///     .with_connection(ConnectionConfig::new().with_request_timeout(Duration::from_secs(10)))
///     .with_prune_disconnected(false);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct AdapterConfig {
    /// Settings for every connection the adapter creates.
    pub connection: ConnectionConfig,

    /// Dials new connections for proactive sends. Without one, a proactive
    /// send to an unknown conversation fails.
    ///
    /// Default: a WebSocket connector when the `websocket` feature is enabled
    pub connector: Option<Arc<dyn TransportConnector>>,

    /// Whether routing drops handlers whose connection has gone away.
    ///
    /// Default: true
    pub prune_disconnected: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        #[cfg(feature = "websocket")]
        let connector: Option<Arc<dyn TransportConnector>> =
            Some(Arc::new(crate::transport::WebSocketConnector::default()));
        #[cfg(not(feature = "websocket"))]
        let connector: Option<Arc<dyn TransportConnector>> = None;

        Self {
            connection: ConnectionConfig::default(),
            connector,
            prune_disconnected: true,
        }
    }
}

impl AdapterConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the connection settings.
    pub fn with_connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = connection;
        self
    }

    /// Sets the connector used for proactive connections.
    pub fn with_connector(mut self, connector: Arc<dyn TransportConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Enables or disables pruning of disconnected handlers.
    pub fn with_prune_disconnected(mut self, enable: bool) -> Self {
        self.prune_disconnected = enable;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.connection.validate()
    }
}

impl fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("connection", &self.connection)
            .field("connector", &self.connector.as_ref().map(|_| "<connector>"))
            .field("prune_disconnected", &self.prune_disconnected)
            .finish()
    }
}
