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

//! Framed requests.

use crate::protocol::ContentStream;
use serde::Serialize;

/// `GET` verb.
pub const GET: &str = "GET";
/// `POST` verb.
pub const POST: &str = "POST";
/// `PUT` verb.
pub const PUT: &str = "PUT";
/// `DELETE` verb.
pub const DELETE: &str = "DELETE";

/// An HTTP-shaped request tunnelled over a streaming connection.
///
/// The same type is used for requests being sent and requests that were
/// received and fully reassembled.
///
/// # Examples
///
/// ```rust
/// use botstream::protocol::StreamingRequest;
/// use serde_json::json;
///
/// let mut request = StreamingRequest::create_post("/v3/conversations/c1/activities");
/// request.set_body_json(&json!({ "type": "message" })).unwrap();
/// assert_eq!(request.verb, "POST");
/// assert_eq!(request.streams.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamingRequest {
    /// Verb, e.g. `POST`
    pub verb: String,
    /// Path, e.g. `/api/version`
    pub path: String,
    /// Body (index 0) followed by attachment streams
    pub streams: Vec<ContentStream>,
}

/// A request as delivered to a request handler.
pub type ReceiveRequest = StreamingRequest;

impl StreamingRequest {
    /// Creates a request with no streams.
    pub fn new(verb: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            path: path.into(),
            streams: Vec::new(),
        }
    }

    /// Creates a `GET` request.
    pub fn create_get(path: impl Into<String>) -> Self {
        Self::new(GET, path)
    }

    /// Creates a `POST` request.
    pub fn create_post(path: impl Into<String>) -> Self {
        Self::new(POST, path)
    }

    /// Creates a `PUT` request.
    pub fn create_put(path: impl Into<String>) -> Self {
        Self::new(PUT, path)
    }

    /// Creates a `DELETE` request.
    pub fn create_delete(path: impl Into<String>) -> Self {
        Self::new(DELETE, path)
    }

    /// Sets stream 0, replacing any existing body.
    pub fn set_body(&mut self, body: ContentStream) {
        if self.streams.is_empty() {
            self.streams.push(body);
        } else {
            self.streams[0] = body;
        }
    }

    /// Serializes `value` as JSON and sets it as the body.
    pub fn set_body_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        self.set_body(ContentStream::json(value)?);
        Ok(())
    }

    /// Appends an attachment stream after the body.
    pub fn add_stream(&mut self, stream: ContentStream) {
        self.streams.push(stream);
    }

    /// Returns the body stream, if present.
    pub fn body(&self) -> Option<&ContentStream> {
        self.streams.first()
    }

    /// Returns the attachment streams following the body.
    pub fn attachments(&self) -> &[ContentStream] {
        self.streams.get(1..).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_body_replaces_first_stream() {
        let mut request = StreamingRequest::create_post("/p");
        request.set_body(ContentStream::text("one"));
        request.add_stream(ContentStream::text("attachment"));
        request.set_body(ContentStream::text("two"));

        assert_eq!(request.streams.len(), 2);
        assert_eq!(request.body().unwrap().read_as_string().unwrap(), "two");
        assert_eq!(request.attachments().len(), 1);
    }

    #[test]
    fn test_empty_request_has_no_attachments() {
        let request = StreamingRequest::create_get("/api/version");
        assert!(request.body().is_none());
        assert!(request.attachments().is_empty());
    }
}
