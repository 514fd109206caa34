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

//! The fixed-width frame header.
//!
//! Every frame on the wire starts with a 48-byte ASCII header:
//!
//! ```text
//! T.LLLLLL.xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx.E\n
//! ```
//!
//! where `T` is the [`PayloadType`], `LLLLLL` the zero-padded decimal payload
//! length, the middle part the hyphenated id of the request, response or stream
//! the frame belongs to, and `E` is `1` on the last frame of that payload.

use crate::protocol::ProtocolError;
use std::fmt;
use uuid::Uuid;

/// Length in bytes of an encoded header.
pub const HEADER_LENGTH: usize = 48;

/// Largest payload length a single header can describe.
pub const MAX_HEADER_PAYLOAD_LENGTH: usize = 999_999;

/// Size at which stream contents are split into separate frames.
pub const MAX_PAYLOAD_LENGTH: usize = 4096;

const DELIMITER: u8 = b'.';
const TERMINATOR: u8 = b'\n';
const LENGTH_DIGITS: usize = 6;
const ID_LENGTH: usize = 36;

/// The kind of payload that follows a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadType {
    /// Request envelope (`A`)
    Request,
    /// Response envelope (`B`)
    Response,
    /// Chunk of a content stream (`S`)
    Stream,
    /// Abandon a request and all of its streams (`X`)
    CancelAll,
    /// Abandon a single stream (`C`)
    CancelStream,
}

impl PayloadType {
    /// Returns the wire character for this payload type.
    pub fn as_char(self) -> char {
        match self {
            PayloadType::Request => 'A',
            PayloadType::Response => 'B',
            PayloadType::Stream => 'S',
            PayloadType::CancelAll => 'X',
            PayloadType::CancelStream => 'C',
        }
    }

    /// Parses a wire character into a payload type.
    pub fn from_char(value: char) -> Result<Self, ProtocolError> {
        match value {
            'A' => Ok(PayloadType::Request),
            'B' => Ok(PayloadType::Response),
            'S' => Ok(PayloadType::Stream),
            'X' => Ok(PayloadType::CancelAll),
            'C' => Ok(PayloadType::CancelStream),
            other => Err(ProtocolError::UnknownPayloadType { value: other }),
        }
    }
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A decoded frame header.
///
/// # Examples
///
/// ```rust
/// use botstream::protocol::{HEADER_LENGTH, Header, PayloadType};
/// use uuid::Uuid;
///
/// let header = Header::new(PayloadType::Stream, 12, Uuid::new_v4(), true);
/// let bytes = header.encode().unwrap();
/// assert_eq!(bytes.len(), HEADER_LENGTH);
/// assert_eq!(Header::decode(&bytes).unwrap(), header);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Kind of payload following the header
    pub payload_type: PayloadType,
    /// Number of payload bytes following the header
    pub payload_length: usize,
    /// Request, response or stream id
    pub id: Uuid,
    /// Whether this is the final frame for `id`
    pub end: bool,
}

impl Header {
    /// Creates a new header.
    pub fn new(payload_type: PayloadType, payload_length: usize, id: Uuid, end: bool) -> Self {
        Self {
            payload_type,
            payload_length,
            id,
            end,
        }
    }

    /// Encodes the header into its 48-byte wire form.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::PayloadTooLarge`] if the payload length does not
    /// fit into six decimal digits.
    pub fn encode(&self) -> Result<[u8; HEADER_LENGTH], ProtocolError> {
        if self.payload_length > MAX_HEADER_PAYLOAD_LENGTH {
            return Err(ProtocolError::PayloadTooLarge {
                length: self.payload_length,
                max: MAX_HEADER_PAYLOAD_LENGTH,
            });
        }

        let text = format!(
            "{}.{:06}.{}.{}\n",
            self.payload_type.as_char(),
            self.payload_length,
            self.id.as_hyphenated(),
            if self.end { '1' } else { '0' },
        );

        let mut bytes = [0u8; HEADER_LENGTH];
        bytes.copy_from_slice(text.as_bytes());
        Ok(bytes)
    }

    /// Decodes a header from its wire form.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidHeader`] when the input is not exactly
    /// [`HEADER_LENGTH`] bytes or any field is malformed, and
    /// [`ProtocolError::UnknownPayloadType`] for an unrecognized type character.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() != HEADER_LENGTH {
            return Err(ProtocolError::invalid_header(format!(
                "expected {} bytes, got {}",
                HEADER_LENGTH,
                bytes.len()
            )));
        }

        let length_start = 2;
        let id_start = length_start + LENGTH_DIGITS + 1;
        let end_index = id_start + ID_LENGTH + 1;

        for index in [1, id_start - 1, end_index - 1] {
            if bytes[index] != DELIMITER {
                return Err(ProtocolError::invalid_header(format!(
                    "missing delimiter at offset {}",
                    index
                )));
            }
        }
        if bytes[HEADER_LENGTH - 1] != TERMINATOR {
            return Err(ProtocolError::invalid_header("missing terminator"));
        }

        let payload_type = PayloadType::from_char(char::from(bytes[0]))?;

        let length_bytes = &bytes[length_start..length_start + LENGTH_DIGITS];
        if !length_bytes.iter().all(u8::is_ascii_digit) {
            return Err(ProtocolError::invalid_header("payload length is not numeric"));
        }
        let payload_length = length_bytes
            .iter()
            .fold(0usize, |acc, digit| acc * 10 + usize::from(digit - b'0'));

        let id_text = std::str::from_utf8(&bytes[id_start..id_start + ID_LENGTH])
            .map_err(|_| ProtocolError::invalid_header("id is not ASCII"))?;
        let id = Uuid::parse_str(id_text)
            .map_err(|e| ProtocolError::invalid_header(format!("invalid id: {}", e)))?;

        let end = match bytes[end_index] {
            b'0' => false,
            b'1' => true,
            other => {
                return Err(ProtocolError::invalid_header(format!(
                    "invalid end flag '{}'",
                    char::from(other)
                )));
            }
        };

        Ok(Self {
            payload_type,
            payload_length,
            id,
            end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let id = Uuid::parse_str("6f2c9a8e-1b4d-4c3a-9e7f-0a1b2c3d4e5f").unwrap();
        let header = Header::new(PayloadType::Request, 42, id, true);
        let bytes = header.encode().unwrap();
        assert_eq!(
            &bytes[..],
            b"A.000042.6f2c9a8e-1b4d-4c3a-9e7f-0a1b2c3d4e5f.1\n"
        );
    }

    #[test]
    fn test_decode_roundtrip_all_types() {
        for payload_type in [
            PayloadType::Request,
            PayloadType::Response,
            PayloadType::Stream,
            PayloadType::CancelAll,
            PayloadType::CancelStream,
        ] {
            let header = Header::new(payload_type, 4096, Uuid::new_v4(), false);
            let decoded = Header::decode(&header.encode().unwrap()).unwrap();
            assert_eq!(decoded, header);
        }
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        let header = Header::new(PayloadType::Stream, 1_000_000, Uuid::new_v4(), true);
        assert!(matches!(
            header.encode(),
            Err(ProtocolError::PayloadTooLarge { length: 1_000_000, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        assert!(matches!(
            Header::decode(b"A.000001"),
            Err(ProtocolError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        let mut bytes = Header::new(PayloadType::Request, 1, Uuid::new_v4(), true)
            .encode()
            .unwrap();
        bytes[0] = b'Z';
        assert!(matches!(
            Header::decode(&bytes),
            Err(ProtocolError::UnknownPayloadType { value: 'Z' })
        ));
    }

    #[test]
    fn test_decode_rejects_bad_fields() {
        let good = Header::new(PayloadType::Stream, 10, Uuid::new_v4(), false)
            .encode()
            .unwrap();

        let mut bad_length = good;
        bad_length[4] = b'x';
        assert!(Header::decode(&bad_length).is_err());

        let mut bad_delimiter = good;
        bad_delimiter[8] = b'-';
        assert!(Header::decode(&bad_delimiter).is_err());

        let mut bad_end = good;
        bad_end[46] = b'7';
        assert!(Header::decode(&bad_end).is_err());

        let mut bad_terminator = good;
        bad_terminator[47] = b' ';
        assert!(Header::decode(&bad_terminator).is_err());

        let mut bad_id = good;
        bad_id[12] = b'g';
        assert!(Header::decode(&bad_id).is_err());
    }
}
