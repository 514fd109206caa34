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

//! Framed request/response protocol.
//!
//! This module defines the envelope that tunnels HTTP-shaped requests and
//! responses over a persistent duplex byte stream, along with the frame format
//! used to put them on the wire.
//!
//! # Messages
//!
//! A [`StreamingRequest`] carries a verb, a path and an ordered list of
//! [`ContentStream`]s. A [`StreamingResponse`] carries a status code and the
//! same kind of stream list. Stream 0 is always the body; any further streams
//! are attachments.
//!
//! # Frames
//!
//! Each message is written as one request (`A`) or response (`B`) frame whose
//! JSON payload describes the verb, path or status and lists the streams by id,
//! followed by stream (`S`) frames carrying the content in chunks of at most
//! [`MAX_PAYLOAD_LENGTH`] bytes. Every frame starts with a fixed 48-byte
//! [`Header`]:
//!
//! ```text
//! A.000073.1c0a5d9e-8d4f-4b7e-a1f0-3e2d4c5b6a79.1\n{"verb":"GET",...}
//! ```
//!
//! # Examples
//!
//! ```rust
//! use botstream::protocol::{ContentStream, StreamingRequest};
//!
//! let mut request = StreamingRequest::create_post("/v3/conversations/abc/activities");
//! request.set_body(ContentStream::text("{}"));
//! request.add_stream(ContentStream::new(Some("image/png".to_string()), vec![0x89, 0x50]));
//! assert_eq!(request.attachments().len(), 1);
//! ```

mod content;
mod error;
mod header;
mod payload;
mod request;
mod response;

pub use self::content::{ContentStream, JSON_CONTENT_TYPE, TEXT_CONTENT_TYPE};
pub use self::error::ProtocolError;
pub use self::header::{
    HEADER_LENGTH, Header, MAX_HEADER_PAYLOAD_LENGTH, MAX_PAYLOAD_LENGTH, PayloadType,
};
pub use self::payload::{RequestPayload, ResponsePayload, StreamDescription, parse_payload};
pub use self::request::{DELETE, GET, POST, PUT, ReceiveRequest, StreamingRequest};
pub use self::response::{ReceiveResponse, StreamingResponse};
