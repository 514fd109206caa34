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

//! Transport layer error types.
//!
//! Transport errors are the lowest level of the crate's error stack. They
//! describe failures of the duplex byte stream itself: establishing it, reading
//! from it, writing to it, or losing it halfway through a conversation.
//!
//! # Error Categories
//!
//! - **Connection errors**: failed to establish, or lost, the duplex channel
//! - **I/O errors**: read/write failures
//! - **Configuration errors**: invalid transport configuration
//! - **Timeout errors**: a request went unanswered for too long

use std::io;
use thiserror::Error;

/// Errors that can occur in the transport layer.
///
/// # Examples
///
/// ```rust
/// use botstream::transport::TransportError;
/// use std::io;
///
/// let error = TransportError::ConnectionFailed {
///     address: "ws://127.0.0.1:3978/api/messages".to_string(),
///     source: io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
/// };
///
/// assert!(error.is_recoverable());
/// assert!(!error.is_disconnect());
/// ```
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to establish a connection to the remote endpoint.
    #[error("failed to connect to {address}: {source}")]
    ConnectionFailed {
        /// The address that failed to connect
        address: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Connection was lost during operation.
    ///
    /// Every request still waiting for a response when the connection drops
    /// completes with this error.
    #[error("connection lost: {reason}")]
    ConnectionLost {
        /// Description of why the connection was lost
        reason: String,
        /// The underlying I/O error, if available
        #[source]
        source: Option<io::Error>,
    },

    /// Failed to read from the transport.
    #[error("read failed: {source}")]
    ReadFailed {
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Failed to write to the transport.
    #[error("write failed: {source}")]
    WriteFailed {
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A request did not receive its response in time.
    #[error("operation timed out after {duration:?}")]
    Timeout {
        /// The duration that was exceeded
        duration: std::time::Duration,
    },

    /// Invalid transport configuration or usage.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
    },

    /// Transport is already closed.
    #[error("transport is closed")]
    Closed,

    /// Transport is not connected.
    #[error("transport is not connected")]
    NotConnected,

    /// Failed to bind a listener to the specified address or pipe name.
    #[error("failed to bind to {address}: {source}")]
    BindFailed {
        /// The address that failed to bind
        address: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// An unexpected I/O error occurred.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// WebSocket-specific error occurred.
    #[cfg(feature = "websocket")]
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

impl TransportError {
    /// Returns `true` if retrying the operation on a new connection may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            TransportError::ConnectionFailed { .. }
            | TransportError::ConnectionLost { .. }
            | TransportError::Timeout { .. }
            | TransportError::NotConnected => true,

            TransportError::ReadFailed { source }
            | TransportError::WriteFailed { source }
            | TransportError::Io { source } => matches!(
                source.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),

            #[cfg(feature = "websocket")]
            TransportError::WebSocket(e) => {
                use tokio_tungstenite::tungstenite::Error as WsError;
                matches!(
                    e,
                    WsError::Io(_) | WsError::ConnectionClosed | WsError::AlreadyClosed
                )
            }

            TransportError::InvalidConfiguration { .. }
            | TransportError::Closed
            | TransportError::BindFailed { .. } => false,
        }
    }

    /// Returns `true` if this error means the connection is gone.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use botstream::transport::TransportError;
    ///
    /// assert!(TransportError::Closed.is_disconnect());
    /// assert!(TransportError::NotConnected.is_disconnect());
    /// ```
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectionLost { .. }
                | TransportError::Closed
                | TransportError::NotConnected
        )
    }

    /// Creates a connection lost error without an underlying I/O error.
    pub fn connection_lost(reason: impl Into<String>) -> Self {
        TransportError::ConnectionLost {
            reason: reason.into(),
            source: None,
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(error: io::Error) -> Self {
        TransportError::Io { source: error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_lost_is_disconnect() {
        let error = TransportError::connection_lost("peer closed");
        assert!(error.is_recoverable());
        assert!(error.is_disconnect());
        assert_eq!(error.to_string(), "connection lost: peer closed");
    }

    #[test]
    fn test_invalid_configuration_not_recoverable() {
        let error = TransportError::InvalidConfiguration {
            reason: "already listening".to_string(),
        };
        assert!(!error.is_recoverable());
        assert!(!error.is_disconnect());
    }

    #[test]
    fn test_transient_io_error_is_recoverable() {
        let error = TransportError::ReadFailed {
            source: io::Error::new(io::ErrorKind::Interrupted, "interrupted"),
        };
        assert!(error.is_recoverable());

        let error = TransportError::WriteFailed {
            source: io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"),
        };
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_from_io_error() {
        let error: TransportError = io::Error::other("boom").into();
        assert!(matches!(error, TransportError::Io { .. }));
    }
}
