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

//! Protocol layer error types.
//!
//! Protocol errors describe frames that arrived intact from the transport but
//! could not be understood: a malformed header, a payload that exceeds what the
//! header format can express, or a request/response payload that is not valid
//! JSON. They never tear down the connection on their own; the session logs
//! them and drops the offending frame.

use thiserror::Error;

/// Errors raised while encoding or decoding streaming frames.
///
/// # Examples
///
/// ```rust
/// use botstream::protocol::{Header, ProtocolError};
///
/// let error = Header::decode(b"not a header").unwrap_err();
/// assert!(matches!(error, ProtocolError::InvalidHeader { .. }));
/// ```
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The 48-byte frame header could not be parsed.
    #[error("invalid frame header: {reason}")]
    InvalidHeader {
        /// What was wrong with the header
        reason: String,
    },

    /// The header named a payload type this implementation does not know.
    #[error("unknown payload type '{value}'")]
    UnknownPayloadType {
        /// The offending type character
        value: char,
    },

    /// A payload is longer than a single frame header can describe.
    #[error("payload of {length} bytes exceeds the maximum of {max} bytes")]
    PayloadTooLarge {
        /// Length of the rejected payload
        length: usize,
        /// Largest length the header can carry
        max: usize,
    },

    /// A request or response payload was not valid JSON.
    #[error("invalid payload: {source}")]
    InvalidPayload {
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
    },
}

impl ProtocolError {
    /// Creates an invalid header error.
    pub fn invalid_header(reason: impl Into<String>) -> Self {
        ProtocolError::InvalidHeader {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(error: serde_json::Error) -> Self {
        ProtocolError::InvalidPayload { source: error }
    }
}
