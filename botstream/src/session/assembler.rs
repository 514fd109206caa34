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

//! Reassembly of requests and responses from incoming frames.

use crate::protocol::{
    ContentStream, Header, PayloadType, ProtocolError, RequestPayload, ResponsePayload,
    StreamDescription, StreamingRequest, StreamingResponse, parse_payload,
};
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

/// A message whose envelope and streams have all arrived.
#[derive(Debug)]
pub(crate) enum Assembled {
    Request(Uuid, StreamingRequest),
    Response(Uuid, StreamingResponse),
}

#[derive(Debug)]
enum Envelope {
    Request { verb: String, path: String },
    Response { status_code: u16 },
}

#[derive(Debug)]
struct PendingMessage {
    envelope: Envelope,
    streams: Vec<StreamDescription>,
    contents: HashMap<Uuid, Vec<u8>>,
}

impl PendingMessage {
    fn is_complete(&self) -> bool {
        self.streams
            .iter()
            .all(|stream| self.contents.contains_key(&stream.id))
    }
}

/// Collects frames until a request or response is complete.
///
/// Envelopes and streams may each span several frames; a message is
/// released once its envelope and every stream it lists have seen their
/// final frame.
#[derive(Debug)]
pub(crate) struct FrameAssembler {
    max_message_size: usize,
    envelopes: HashMap<Uuid, Vec<u8>>,
    messages: HashMap<Uuid, PendingMessage>,
    stream_owners: HashMap<Uuid, Uuid>,
    partial_streams: HashMap<Uuid, Vec<u8>>,
}

impl FrameAssembler {
    pub(crate) fn new(max_message_size: usize) -> Self {
        Self {
            max_message_size,
            envelopes: HashMap::new(),
            messages: HashMap::new(),
            stream_owners: HashMap::new(),
            partial_streams: HashMap::new(),
        }
    }

    /// Feeds one frame in, returning a message if it completed one.
    pub(crate) fn accept(
        &mut self,
        header: Header,
        payload: Vec<u8>,
    ) -> Result<Option<Assembled>, ProtocolError> {
        match header.payload_type {
            PayloadType::Request | PayloadType::Response => self.accept_envelope(header, payload),
            PayloadType::Stream => self.accept_stream(header, payload),
            PayloadType::CancelAll => {
                debug!(message_id = %header.id, "Peer cancelled message");
                self.discard_message(header.id);
                Ok(None)
            }
            PayloadType::CancelStream => {
                // Deliver whatever arrived before the cancel
                let data = self.partial_streams.remove(&header.id).unwrap_or_default();
                Ok(self.finish_stream(header.id, data))
            }
        }
    }

    /// Returns `true` if no partially received message is held.
    #[cfg(test)]
    pub(crate) fn is_idle(&self) -> bool {
        self.envelopes.is_empty() && self.messages.is_empty() && self.partial_streams.is_empty()
    }

    fn accept_envelope(
        &mut self,
        header: Header,
        payload: Vec<u8>,
    ) -> Result<Option<Assembled>, ProtocolError> {
        let buffer = self.envelopes.entry(header.id).or_default();
        buffer.extend_from_slice(&payload);
        if buffer.len() > self.max_message_size {
            let length = buffer.len();
            self.envelopes.remove(&header.id);
            return Err(ProtocolError::PayloadTooLarge {
                length,
                max: self.max_message_size,
            });
        }
        if !header.end {
            return Ok(None);
        }

        let bytes = self.envelopes.remove(&header.id).unwrap_or_default();
        let (envelope, streams) = if header.payload_type == PayloadType::Request {
            let payload: RequestPayload = parse_payload(&bytes)?;
            let envelope = Envelope::Request {
                verb: payload.verb,
                path: payload.path,
            };
            (envelope, payload.streams)
        } else {
            let payload: ResponsePayload = parse_payload(&bytes)?;
            let envelope = Envelope::Response {
                status_code: payload.status_code,
            };
            (envelope, payload.streams)
        };

        for stream in &streams {
            self.stream_owners.insert(stream.id, header.id);
        }
        self.messages.insert(
            header.id,
            PendingMessage {
                envelope,
                streams,
                contents: HashMap::new(),
            },
        );

        Ok(self.release_if_complete(header.id))
    }

    fn accept_stream(
        &mut self,
        header: Header,
        payload: Vec<u8>,
    ) -> Result<Option<Assembled>, ProtocolError> {
        if !self.stream_owners.contains_key(&header.id) {
            warn!(stream_id = %header.id, length = payload.len(), "Dropping orphaned stream frame");
            return Ok(None);
        }

        let buffer = self.partial_streams.entry(header.id).or_default();
        buffer.extend_from_slice(&payload);
        if buffer.len() > self.max_message_size {
            let length = buffer.len();
            if let Some(owner) = self.stream_owners.get(&header.id).copied() {
                self.discard_message(owner);
            }
            return Err(ProtocolError::PayloadTooLarge {
                length,
                max: self.max_message_size,
            });
        }
        if !header.end {
            return Ok(None);
        }

        let data = self.partial_streams.remove(&header.id).unwrap_or_default();
        Ok(self.finish_stream(header.id, data))
    }

    fn finish_stream(&mut self, stream_id: Uuid, data: Vec<u8>) -> Option<Assembled> {
        let owner = self.stream_owners.remove(&stream_id)?;
        let message = self.messages.get_mut(&owner)?;
        message.contents.insert(stream_id, data);
        self.release_if_complete(owner)
    }

    fn release_if_complete(&mut self, message_id: Uuid) -> Option<Assembled> {
        if !self.messages.get(&message_id)?.is_complete() {
            return None;
        }
        let mut message = self.messages.remove(&message_id)?;

        let streams = message
            .streams
            .into_iter()
            .map(|description| {
                let data = message.contents.remove(&description.id).unwrap_or_default();
                ContentStream::with_id(description.id, description.content_type, data)
            })
            .collect();

        Some(match message.envelope {
            Envelope::Request { verb, path } => Assembled::Request(
                message_id,
                StreamingRequest {
                    verb,
                    path,
                    streams,
                },
            ),
            Envelope::Response { status_code } => Assembled::Response(
                message_id,
                StreamingResponse {
                    status_code,
                    streams,
                },
            ),
        })
    }

    fn discard_message(&mut self, message_id: Uuid) {
        self.envelopes.remove(&message_id);
        if let Some(message) = self.messages.remove(&message_id) {
            for stream in message.streams {
                self.stream_owners.remove(&stream.id);
                self.partial_streams.remove(&stream.id);
            }
        }
    }
}
