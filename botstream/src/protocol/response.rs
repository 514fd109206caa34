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

//! Framed responses.

use crate::protocol::ContentStream;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// An HTTP-shaped response tunnelled over a streaming connection.
///
/// # Examples
///
/// ```rust
/// use botstream::protocol::StreamingResponse;
///
/// let response = StreamingResponse::bad_request().with_text("missing body");
/// assert_eq!(response.status_code, 400);
/// assert_eq!(response.body_as_string().as_deref(), Some("missing body"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamingResponse {
    /// HTTP-style status code
    pub status_code: u16,
    /// Body (index 0) followed by any further streams
    pub streams: Vec<ContentStream>,
}

/// A response as delivered to the sender of a request.
pub type ReceiveResponse = StreamingResponse;

impl StreamingResponse {
    /// Creates a response with the given status and no body.
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            streams: Vec::new(),
        }
    }

    /// `200 OK`
    pub fn ok() -> Self {
        Self::new(200)
    }

    /// `400 Bad Request`
    pub fn bad_request() -> Self {
        Self::new(400)
    }

    /// `404 Not Found`
    pub fn not_found() -> Self {
        Self::new(404)
    }

    /// `500 Internal Server Error`
    pub fn internal_server_error() -> Self {
        Self::new(500)
    }

    /// `501 Not Implemented`
    pub fn not_implemented() -> Self {
        Self::new(501)
    }

    /// Sets stream 0, replacing any existing body.
    pub fn set_body(&mut self, body: ContentStream) {
        if self.streams.is_empty() {
            self.streams.push(body);
        } else {
            self.streams[0] = body;
        }
    }

    /// Returns this response with a plain text body.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_body(ContentStream::text(text));
        self
    }

    /// Returns this response with a JSON body.
    pub fn with_json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.set_body(ContentStream::json(value)?);
        Ok(self)
    }

    /// Returns `true` for 2xx status codes.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Returns the body stream, if present.
    pub fn body(&self) -> Option<&ContentStream> {
        self.streams.first()
    }

    /// Reads the body as UTF-8 text. Returns `None` without a valid body.
    pub fn body_as_string(&self) -> Option<String> {
        self.body().and_then(|body| body.read_as_string().ok())
    }

    /// Reads the body as JSON. Returns `None` if there is no body.
    pub fn body_as_json<T: DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        self.body().map(ContentStream::read_as_json)
    }
}
