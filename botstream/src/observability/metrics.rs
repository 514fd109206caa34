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

//! Counters for streaming connections, handlers and routing.
//!
//! Counters are kept in atomics so they can be read in tests and health checks
//! without any exporter. With the `observability` feature every update is also
//! forwarded to the `metrics` crate facade.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for streaming operations.
///
/// # Examples
///
/// ```rust
/// use botstream::observability::StreamingMetrics;
///
/// let metrics = StreamingMetrics::new();
/// metrics.record_connection_opened();
/// metrics.record_request_received();
/// metrics.record_response_status(200);
///
/// assert_eq!(metrics.active_connections(), 1);
/// assert_eq!(metrics.requests_received(), 1);
/// assert_eq!(metrics.responses_success(), 1);
/// ```
#[derive(Debug, Default)]
pub struct StreamingMetrics {
    /// Connections opened
    connections_opened: AtomicU64,
    /// Connections closed
    connections_closed: AtomicU64,
    /// Inbound requests handed to a request handler
    requests_received: AtomicU64,
    /// Responses with a 2xx status
    responses_success: AtomicU64,
    /// Responses with a 4xx status
    responses_client_error: AtomicU64,
    /// Responses with a 5xx status
    responses_server_error: AtomicU64,
    /// Activities delivered through `send_activity`
    activities_sent: AtomicU64,
    /// Outbound sends that ended in a soft failure
    send_failures: AtomicU64,
    /// Frames dropped because they could not be decoded
    frame_errors: AtomicU64,
    /// Conversations dropped from a handler by the router
    conversations_forgotten: AtomicU64,
}

impl StreamingMetrics {
    /// Creates a new metrics tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a connection being opened.
    pub fn record_connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        {
            metrics::counter!("botstream.connections.opened").increment(1);
            metrics::gauge!("botstream.connections.active").increment(1.0);
        }
    }

    /// Records a connection being closed.
    pub fn record_connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        {
            metrics::counter!("botstream.connections.closed").increment(1);
            metrics::gauge!("botstream.connections.active").decrement(1.0);
        }
    }

    /// Records an inbound request.
    pub fn record_request_received(&self) {
        self.requests_received.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("botstream.requests.received").increment(1);
    }

    /// Records the status code of a response produced by a request handler.
    pub fn record_response_status(&self, status: u16) {
        let counter = match status {
            200..=299 => &self.responses_success,
            400..=499 => &self.responses_client_error,
            500..=599 => &self.responses_server_error,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("botstream.responses", "class" => status_class(status)).increment(1);
    }

    /// Records an activity delivered to the peer.
    pub fn record_activity_sent(&self) {
        self.activities_sent.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("botstream.activities.sent").increment(1);
    }

    /// Records an outbound send that failed softly.
    pub fn record_send_failure(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("botstream.send.failures").increment(1);
    }

    /// Records a frame that could not be decoded.
    pub fn record_frame_error(&self) {
        self.frame_errors.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("botstream.frames.errors").increment(1);
    }

    /// Records a conversation forgotten by a handler that lost a routing race.
    pub fn record_conversation_forgotten(&self) {
        self.conversations_forgotten.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("botstream.conversations.forgotten").increment(1);
    }

    /// Returns the number of currently open connections.
    #[must_use]
    pub fn active_connections(&self) -> u64 {
        let opened = self.connections_opened.load(Ordering::Relaxed);
        let closed = self.connections_closed.load(Ordering::Relaxed);
        opened.saturating_sub(closed)
    }

    /// Returns the total number of connections opened.
    #[must_use]
    pub fn connections_opened(&self) -> u64 {
        self.connections_opened.load(Ordering::Relaxed)
    }

    /// Returns the total number of connections closed.
    #[must_use]
    pub fn connections_closed(&self) -> u64 {
        self.connections_closed.load(Ordering::Relaxed)
    }

    /// Returns the number of inbound requests.
    #[must_use]
    pub fn requests_received(&self) -> u64 {
        self.requests_received.load(Ordering::Relaxed)
    }

    /// Returns the number of 2xx responses.
    #[must_use]
    pub fn responses_success(&self) -> u64 {
        self.responses_success.load(Ordering::Relaxed)
    }

    /// Returns the number of 4xx responses.
    #[must_use]
    pub fn responses_client_error(&self) -> u64 {
        self.responses_client_error.load(Ordering::Relaxed)
    }

    /// Returns the number of 5xx responses.
    #[must_use]
    pub fn responses_server_error(&self) -> u64 {
        self.responses_server_error.load(Ordering::Relaxed)
    }

    /// Returns the number of activities sent.
    #[must_use]
    pub fn activities_sent(&self) -> u64 {
        self.activities_sent.load(Ordering::Relaxed)
    }

    /// Returns the number of soft send failures.
    #[must_use]
    pub fn send_failures(&self) -> u64 {
        self.send_failures.load(Ordering::Relaxed)
    }

    /// Returns the number of undecodable frames.
    #[must_use]
    pub fn frame_errors(&self) -> u64 {
        self.frame_errors.load(Ordering::Relaxed)
    }

    /// Returns the number of conversations forgotten by the router.
    #[must_use]
    pub fn conversations_forgotten(&self) -> u64 {
        self.conversations_forgotten.load(Ordering::Relaxed)
    }
}

#[cfg(feature = "observability")]
fn status_class(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_lifecycle() {
        let metrics = StreamingMetrics::new();
        metrics.record_connection_opened();
        metrics.record_connection_opened();
        metrics.record_connection_closed();

        assert_eq!(metrics.connections_opened(), 2);
        assert_eq!(metrics.connections_closed(), 1);
        assert_eq!(metrics.active_connections(), 1);
    }

    #[test]
    fn test_response_classes() {
        let metrics = StreamingMetrics::new();
        metrics.record_response_status(200);
        metrics.record_response_status(501);
        metrics.record_response_status(400);
        metrics.record_response_status(500);
        metrics.record_response_status(302);

        assert_eq!(metrics.responses_success(), 1);
        assert_eq!(metrics.responses_client_error(), 1);
        assert_eq!(metrics.responses_server_error(), 2);
    }

    #[test]
    fn test_active_connections_never_negative() {
        let metrics = StreamingMetrics::new();
        metrics.record_connection_closed();
        assert_eq!(metrics.active_connections(), 0);
    }
}
