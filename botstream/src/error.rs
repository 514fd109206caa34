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

//! Top-level error types.
//!
//! The crate layers its errors the same way the connection itself is layered:
//!
//! 1. **Transport**: the duplex byte stream failed ([`TransportError`])
//! 2. **Protocol**: a frame arrived but could not be understood ([`ProtocolError`])
//! 3. **Application**: the bot callback failed ([`BotError`])
//!
//! [`StreamingError`] composes these and adds the outcomes that only make sense
//! at the handler and router level, such as sending through a handler whose
//! connection is already gone.
//!
//! # Hard and soft failures
//!
//! Outbound operations return `Result<Option<T>, StreamingError>`. An `Err` is a
//! hard failure the caller must deal with (the connection is gone, the service
//! URL is unusable). `Ok(None)` is a soft failure that has already been logged:
//! the peer answered with a non-success status, the request timed out, or no
//! connection owns the conversation.
//!
//! # Examples
//!
//! ```rust
//! use botstream::StreamingError;
//! use botstream::transport::TransportError;
//!
//! let error: StreamingError = TransportError::Closed.into();
//! assert!(error.is_transport_error());
//! assert!(error.is_disconnected());
//! ```

use crate::protocol::ProtocolError;
use crate::transport::TransportError;
use std::error::Error as StdError;
use std::fmt;

/// Error returned by a bot callback.
pub type BotError = Box<dyn StdError + Send + Sync>;

/// Top-level error type for streaming operations.
#[derive(Debug)]
pub enum StreamingError {
    /// The underlying transport failed.
    Transport(TransportError),

    /// A frame could not be encoded or decoded.
    Protocol(ProtocolError),

    /// The handler's connection has disconnected.
    ///
    /// Returned immediately, before any I/O is attempted, so a caller never
    /// waits on a dead connection.
    Disconnected,

    /// A synthetic streaming service URL could not be turned into an endpoint.
    InvalidServiceUrl {
        /// The URL that was rejected
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// The operation was cancelled through its cancellation token.
    Cancelled,

    /// An activity or payload could not be serialized.
    Serialization(serde_json::Error),

    /// The bot callback failed.
    Bot(BotError),
}

impl StreamingError {
    /// Returns `true` if this is a transport error.
    #[must_use]
    pub const fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` if this is a protocol error.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }

    /// Returns `true` if this error came from the bot callback.
    #[must_use]
    pub const fn is_bot_error(&self) -> bool {
        matches!(self, Self::Bot(_))
    }

    /// Returns `true` if the operation was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if this error means the connection is gone.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use botstream::StreamingError;
    ///
    /// assert!(StreamingError::Disconnected.is_disconnected());
    /// assert!(!StreamingError::Cancelled.is_disconnected());
    /// ```
    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        match self {
            Self::Disconnected => true,
            Self::Transport(e) => e.is_disconnect(),
            _ => false,
        }
    }

    /// Creates an invalid service URL error.
    pub fn invalid_service_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidServiceUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for StreamingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport error: {}", e),
            Self::Protocol(e) => write!(f, "protocol error: {}", e),
            Self::Disconnected => write!(f, "streaming connection is disconnected"),
            Self::InvalidServiceUrl { url, reason } => {
                write!(f, "invalid streaming service URL '{}': {}", url, reason)
            }
            Self::Cancelled => write!(f, "operation was cancelled"),
            Self::Serialization(e) => write!(f, "serialization error: {}", e),
            Self::Bot(e) => write!(f, "bot error: {}", e),
        }
    }
}

impl StdError for StreamingError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Protocol(e) => Some(e),
            Self::Serialization(e) => Some(e),
            Self::Bot(e) => Some(e.as_ref()),
            Self::Disconnected | Self::InvalidServiceUrl { .. } | Self::Cancelled => None,
        }
    }
}

impl From<TransportError> for StreamingError {
    fn from(error: TransportError) -> Self {
        Self::Transport(error)
    }
}

impl From<ProtocolError> for StreamingError {
    fn from(error: ProtocolError) -> Self {
        Self::Protocol(error)
    }
}

impl From<serde_json::Error> for StreamingError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_predicates() {
        let error = StreamingError::Transport(TransportError::Closed);
        assert!(error.is_transport_error());
        assert!(!error.is_protocol_error());

        let error = StreamingError::Protocol(ProtocolError::invalid_header("short"));
        assert!(error.is_protocol_error());
        assert!(!error.is_disconnected());

        let error = StreamingError::Bot(Box::new(io::Error::other("boom")));
        assert!(error.is_bot_error());
        assert!(StreamingError::Cancelled.is_cancelled());
    }

    #[test]
    fn test_disconnect_classification() {
        assert!(StreamingError::Disconnected.is_disconnected());
        assert!(StreamingError::from(TransportError::connection_lost("eof")).is_disconnected());
        assert!(
            !StreamingError::from(TransportError::Timeout {
                duration: std::time::Duration::from_secs(1),
            })
            .is_disconnected()
        );
    }

    #[test]
    fn test_display() {
        let error = StreamingError::invalid_service_url("urn:x", "missing host");
        assert_eq!(
            error.to_string(),
            "invalid streaming service URL 'urn:x': missing host"
        );

        let error = StreamingError::Bot(Box::new(io::Error::other("boom")));
        assert_eq!(error.to_string(), "bot error: boom");
    }

    #[test]
    fn test_error_source() {
        assert!(StreamingError::from(TransportError::Closed).source().is_some());
        assert!(StreamingError::Disconnected.source().is_none());

        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: StreamingError = json_error.into();
        assert!(error.source().is_some());
    }
}
