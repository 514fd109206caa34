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

//! Named byte streams attached to requests and responses.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::string::FromUtf8Error;
use uuid::Uuid;

/// MIME type used for JSON bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// MIME type used for plain text bodies.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// One content stream of a request or response.
///
/// Stream 0 of a message is its body; any further streams are attachments.
///
/// # Examples
///
/// ```rust
/// use botstream::protocol::ContentStream;
///
/// let stream = ContentStream::text("hello");
/// assert_eq!(stream.read_as_string().unwrap(), "hello");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentStream {
    /// Stream id used on the wire
    pub id: Uuid,
    /// MIME type of the content, if any
    pub content_type: Option<String>,
    /// Raw content
    pub data: Vec<u8>,
}

impl ContentStream {
    /// Creates a stream with a fresh id.
    pub fn new(content_type: Option<String>, data: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content_type,
            data,
        }
    }

    /// Creates a stream with an explicit id, as used when reassembling
    /// received frames.
    pub fn with_id(id: Uuid, content_type: Option<String>, data: Vec<u8>) -> Self {
        Self {
            id,
            content_type,
            data,
        }
    }

    /// Creates a UTF-8 text stream.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(
            Some(TEXT_CONTENT_TYPE.to_string()),
            text.into().into_bytes(),
        )
    }

    /// Creates a JSON stream from a serializable value.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(
            Some(JSON_CONTENT_TYPE.to_string()),
            serde_json::to_vec(value)?,
        ))
    }

    /// Returns the content length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the stream carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reads the content as UTF-8 text.
    pub fn read_as_string(&self) -> Result<String, FromUtf8Error> {
        String::from_utf8(self.data.clone())
    }

    /// Reads the content as JSON.
    pub fn read_as_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_stream() {
        let stream = ContentStream::json(&json!({ "id": "abc" })).unwrap();
        assert_eq!(stream.content_type.as_deref(), Some(JSON_CONTENT_TYPE));

        let value: serde_json::Value = stream.read_as_json().unwrap();
        assert_eq!(value["id"], "abc");
    }

    #[test]
    fn test_invalid_utf8() {
        let stream = ContentStream::new(None, vec![0xff, 0xfe]);
        assert!(stream.read_as_string().is_err());
        assert_eq!(stream.len(), 2);
    }

    #[test]
    fn test_streams_get_distinct_ids() {
        assert_ne!(ContentStream::text("a").id, ContentStream::text("a").id);
    }
}
