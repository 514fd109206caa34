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
use std::fmt;
use std::str::FromStr;

/// A synthetic streaming service URL, `urn:<channel>:<protocol>:<host>`.
///
/// Activities arriving over a streaming connection carry this form instead
/// of an HTTP endpoint. It names the endpoint the bot dials when it has to
/// open a connection itself.
///
/// # Examples
///
/// ```rust
/// use botstream::adapter::StreamingServiceUrl;
///
/// let url: StreamingServiceUrl = "urn:directline:wss:localhost:3978".parse().unwrap();
/// assert_eq!(url.channel(), "directline");
/// assert_eq!(url.endpoint_url(), "wss://localhost:3978/api/messages");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamingServiceUrl {
    channel: String,
    protocol: String,
    host: String,
}

impl StreamingServiceUrl {
    /// Parses a synthetic service URL.
    ///
    /// The last two colon-delimited segments are the protocol and the host.
    /// A trailing numeric segment is read as the host's port, and a `//` in
    /// front of the host is tolerated. Anything between `urn:` and the
    /// protocol is the channel.
    pub fn parse(url: &str) -> Result<Self, StreamingError> {
        let mut segments: Vec<&str> = url.split(':').collect();
        if !segments[0].eq_ignore_ascii_case("urn") {
            return Err(StreamingError::invalid_service_url(url, "expected a urn: scheme"));
        }

        let port = match segments.last() {
            Some(last) if segments.len() > 4 && is_port(last) => segments.pop(),
            _ => None,
        };
        if segments.len() < 4 {
            return Err(StreamingError::invalid_service_url(
                url,
                "expected urn:<channel>:<protocol>:<host>",
            ));
        }

        let host = segments[segments.len() - 1].trim_start_matches("//");
        let protocol = segments[segments.len() - 2];
        let channel = segments[1..segments.len() - 2].join(":");
        if channel.is_empty() || protocol.is_empty() || host.is_empty() {
            return Err(StreamingError::invalid_service_url(url, "empty segment"));
        }

        let host = match port {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        Ok(Self {
            channel,
            protocol: protocol.to_string(),
            host,
        })
    }

    /// Returns the channel name.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Returns the protocol, e.g. `wss`.
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Returns the host, including any port.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the messaging endpoint to dial.
    pub fn endpoint_url(&self) -> String {
        format!("{}://{}/api/messages", self.protocol, self.host)
    }
}

impl FromStr for StreamingServiceUrl {
    type Err = StreamingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_port(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for StreamingServiceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "urn:{}:{}:{}", self.channel, self.protocol, self.host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let url = StreamingServiceUrl::parse("urn:test:ws:localhost").unwrap();
        assert_eq!(url.channel(), "test");
        assert_eq!(url.protocol(), "ws");
        assert_eq!(url.host(), "localhost");
        assert_eq!(url.endpoint_url(), "ws://localhost/api/messages");
        assert_eq!(url.to_string(), "urn:test:ws:localhost");
    }

    #[test]
    fn test_host_with_port_and_slashes() {
        let url = StreamingServiceUrl::parse("urn:test:wss:127.0.0.1:3978").unwrap();
        assert_eq!(url.endpoint_url(), "wss://127.0.0.1:3978/api/messages");

        let url = StreamingServiceUrl::parse("urn:FakeName:fakeProtocol://fakePath").unwrap();
        assert_eq!(url.endpoint_url(), "fakeProtocol://fakePath/api/messages");
    }

    #[test]
    fn test_protocol_and_host_are_trailing_segments() {
        let url = StreamingServiceUrl::parse("urn:a:b:wss:host").unwrap();
        assert_eq!(url.channel(), "a:b");
        assert_eq!(url.protocol(), "wss");
        assert_eq!(url.host(), "host");

        let url = StreamingServiceUrl::parse("urn:a:b:wss:host:443").unwrap();
        assert_eq!(url.protocol(), "wss");
        assert_eq!(url.host(), "host:443");
        assert_eq!(url.endpoint_url(), "wss://host:443/api/messages");
    }

    #[test]
    fn test_reject_malformed() {
        for url in ["https://bot.example.com", "urn:test:wss", "urn::wss:host", "urn:test:wss:", ""] {
            let error = StreamingServiceUrl::parse(url).unwrap_err();
            assert!(matches!(error, StreamingError::InvalidServiceUrl { .. }), "{}", url);
        }
    }
}
