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

//! JSON envelopes carried by request and response frames.

use crate::protocol::ProtocolError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Describes one content stream that follows a request or response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescription {
    /// Id of the stream frames carrying the content
    pub id: Uuid,
    /// MIME type of the content
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Total content length, when known up front
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
}

/// Payload of a request (`A`) frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPayload {
    /// HTTP-style verb
    #[serde(default)]
    pub verb: String,
    /// Request path
    #[serde(default)]
    pub path: String,
    /// Streams that belong to this request, body first
    #[serde(default)]
    pub streams: Vec<StreamDescription>,
}

/// Payload of a response (`B`) frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePayload {
    /// HTTP-style status code
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// Streams that belong to this response, body first
    #[serde(default)]
    pub streams: Vec<StreamDescription>,
}

/// Parses a JSON envelope, ignoring a leading UTF-8 byte order mark.
pub fn parse_payload<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_payload_wire_names() {
        let id = Uuid::new_v4();
        let payload = RequestPayload {
            verb: "POST".to_string(),
            path: "/api/messages".to_string(),
            streams: vec![StreamDescription {
                id,
                content_type: Some("application/json".to_string()),
                length: Some(12),
            }],
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["verb"], "POST");
        assert_eq!(value["path"], "/api/messages");
        assert_eq!(value["streams"][0]["id"], id.to_string());
        assert_eq!(value["streams"][0]["type"], "application/json");
        assert_eq!(value["streams"][0]["length"], 12);
    }

    #[test]
    fn test_response_payload_status_code() {
        let payload: ResponsePayload = parse_payload(br#"{"statusCode":404}"#).unwrap();
        assert_eq!(payload.status_code, 404);
        assert!(payload.streams.is_empty());
    }

    #[test]
    fn test_parse_payload_strips_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(br#"{"verb":"GET","path":"/api/version"}"#);

        let payload: RequestPayload = parse_payload(&bytes).unwrap();
        assert_eq!(payload.verb, "GET");
        assert_eq!(payload.path, "/api/version");
    }

    #[test]
    fn test_parse_payload_rejects_garbage() {
        let result: Result<RequestPayload, _> = parse_payload(b"{not json");
        assert!(matches!(result, Err(ProtocolError::InvalidPayload { .. })));
    }
}
