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

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Content of an [`Attachment`].
#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentContent {
    /// JSON content, serialized inside the activity body.
    Inline(Value),

    /// Raw bytes. Never written into the activity body; carried on the wire
    /// as a separate stream after the body.
    Stream(Vec<u8>),
}

/// An activity attachment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// MIME type of the content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// URL the content can be fetched from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Inline or stream-backed content
    #[serde(default, skip_serializing_if = "not_inline", with = "content")]
    pub content: Option<AttachmentContent>,

    /// Members not modelled here
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Attachment {
    /// Creates an attachment with inline JSON content.
    pub fn inline(content_type: impl Into<String>, content: Value) -> Self {
        Self {
            content_type: Some(content_type.into()),
            content: Some(AttachmentContent::Inline(content)),
            ..Self::default()
        }
    }

    /// Creates an attachment whose bytes travel as a separate stream.
    pub fn stream(content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self::from_stream(Some(content_type.into()), data)
    }

    pub(crate) fn from_stream(content_type: Option<String>, data: Vec<u8>) -> Self {
        Self {
            content_type,
            content: Some(AttachmentContent::Stream(data)),
            ..Self::default()
        }
    }

    /// Returns the inline content, if any.
    pub fn inline_content(&self) -> Option<&Value> {
        match &self.content {
            Some(AttachmentContent::Inline(value)) => Some(value),
            _ => None,
        }
    }

    /// Returns the stream bytes, if any.
    pub fn stream_content(&self) -> Option<&[u8]> {
        match &self.content {
            Some(AttachmentContent::Stream(data)) => Some(data),
            _ => None,
        }
    }
}

fn not_inline(content: &Option<AttachmentContent>) -> bool {
    !matches!(content, Some(AttachmentContent::Inline(_)))
}

mod content {
    use super::AttachmentContent;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    pub(super) fn serialize<S: Serializer>(
        content: &Option<AttachmentContent>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match content {
            Some(AttachmentContent::Inline(value)) => value.serialize(serializer),
            _ => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<AttachmentContent>, D::Error> {
        Ok(Option::<Value>::deserialize(deserializer)?.map(AttachmentContent::Inline))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inline_content_serialized() {
        let attachment = Attachment::inline("application/vnd.card", json!({"title": "t"}));
        let value = serde_json::to_value(&attachment).unwrap();
        assert_eq!(value["contentType"], "application/vnd.card");
        assert_eq!(value["content"]["title"], "t");
    }

    #[test]
    fn test_stream_content_not_serialized() {
        let attachment = Attachment::stream("image/png", vec![0; 16]);
        let value = serde_json::to_value(&attachment).unwrap();
        assert_eq!(value, json!({"contentType": "image/png"}));
    }

    #[test]
    fn test_deserialize_content() {
        let attachment: Attachment =
            serde_json::from_str(r#"{"contentType":"x","content":[1,2],"thumbnailUrl":"u"}"#)
                .unwrap();
        assert_eq!(attachment.inline_content(), Some(&json!([1, 2])));
        assert_eq!(attachment.extra["thumbnailUrl"], "u");

        let attachment: Attachment = serde_json::from_str(r#"{"contentType":"x"}"#).unwrap();
        assert!(attachment.content.is_none());
        assert!(attachment.stream_content().is_none());
    }
}
