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

//! Configuration for streaming connections.

use crate::protocol::{MAX_HEADER_PAYLOAD_LENGTH, MAX_PAYLOAD_LENGTH};
use std::time::Duration;

/// Configuration for a [`StreamingConnection`](crate::session::StreamingConnection).
///
/// # Examples
///
/// ```rust
/// use botstream::session::ConnectionConfig;
/// use std::time::Duration;
///
/// let config = ConnectionConfig::new()
///     .with_request_timeout(Duration::from_secs(5))
///     .with_max_chunk_size(1024);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// How long an outbound request waits for its response.
    ///
    /// Default: 30 seconds
    pub request_timeout: Duration,

    /// Largest payload written in a single frame. Longer bodies and streams
    /// are split across several frames.
    ///
    /// Default: 4096 bytes
    pub max_chunk_size: usize,

    /// Largest reassembled envelope or stream accepted from the peer.
    ///
    /// A message exceeding this is dropped and logged.
    ///
    /// Default: 64 MB
    pub max_message_size: usize,

    /// Whether the write half of the transport is shut down when the
    /// connection closes, so the peer observes end-of-stream.
    ///
    /// Default: true
    pub shutdown_on_close: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_chunk_size: MAX_PAYLOAD_LENGTH,
            max_message_size: 64 * 1024 * 1024, // 64 MB
            shutdown_on_close: true,
        }
    }
}

impl ConnectionConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the outbound request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the maximum frame payload size.
    pub fn with_max_chunk_size(mut self, size: usize) -> Self {
        self.max_chunk_size = size;
        self
    }

    /// Sets the maximum reassembled message size.
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Sets whether the transport is shut down on close.
    pub fn with_shutdown_on_close(mut self, enable: bool) -> Self {
        self.shutdown_on_close = enable;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The request timeout is zero
    /// - The chunk size is zero or larger than a frame header can describe
    /// - The maximum message size is zero
    pub fn validate(&self) -> Result<(), String> {
        if self.request_timeout.is_zero() {
            return Err("request_timeout must be greater than 0".to_string());
        }
        if self.max_chunk_size == 0 || self.max_chunk_size > MAX_HEADER_PAYLOAD_LENGTH {
            return Err(format!(
                "max_chunk_size must be between 1 and {}",
                MAX_HEADER_PAYLOAD_LENGTH
            ));
        }
        if self.max_message_size == 0 {
            return Err("max_message_size must be greater than 0".to_string());
        }
        Ok(())
    }
}
