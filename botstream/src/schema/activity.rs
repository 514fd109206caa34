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

use crate::protocol::ContentStream;
use crate::schema::{Attachment, AttachmentContent};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Reads an explicit `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Well-known values of [`Activity::activity_type`].
pub mod activity_types {
    /// A message from a user or bot.
    pub const MESSAGE: &str = "message";
    /// An out-of-band event.
    pub const EVENT: &str = "event";
    /// A request expecting an [`InvokeResponse`](crate::schema::InvokeResponse).
    pub const INVOKE: &str = "invoke";
    /// The conversation has ended.
    pub const END_OF_CONVERSATION: &str = "endOfConversation";
    /// Members joined or left the conversation.
    pub const CONVERSATION_UPDATE: &str = "conversationUpdate";
    /// Typing indicator.
    pub const TYPING: &str = "typing";
}

/// The conversation an activity belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationAccount {
    /// Conversation id
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,

    /// Members not modelled here
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConversationAccount {
    /// Creates an account for the given conversation id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            extra: Map::new(),
        }
    }
}

/// A Bot Framework activity.
///
/// # Examples
///
/// ```rust
/// use botstream::schema::{Activity, activity_types};
///
/// let json = r#"{
///     "type": "message",
///     "text": "hi",
///     "conversation": { "id": "c1" },
///     "serviceUrl": "urn:test:wss:localhost"
/// }"#;
/// let activity: Activity = serde_json::from_str(json).unwrap();
///
/// assert_eq!(activity.activity_type, activity_types::MESSAGE);
/// assert_eq!(activity.conversation_id(), Some("c1"));
/// assert_eq!(activity.extra["text"], "hi");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Activity type, see [`activity_types`]
    #[serde(
        rename = "type",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub activity_type: String,

    /// Activity id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Conversation the activity belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,

    /// Endpoint replies are sent to. Streaming connections use a synthetic
    /// `urn:<channel>:<protocol>:<host>` value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,

    /// Id of the activity this one replies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,

    /// Identity of the sender, derived from the connection's audience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_id: Option<String>,

    /// Attachments, both inline and stream-backed
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub attachments: Vec<Attachment>,

    /// Members not modelled here
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Activity {
    /// Creates an activity of the given type in a conversation.
    pub fn new(activity_type: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            activity_type: activity_type.into(),
            conversation: Some(ConversationAccount::new(conversation_id)),
            ..Self::default()
        }
    }

    /// Sets the service URL.
    pub fn with_service_url(mut self, service_url: impl Into<String>) -> Self {
        self.service_url = Some(service_url.into());
        self
    }

    /// Sets the id of the activity being replied to.
    pub fn with_reply_to_id(mut self, reply_to_id: impl Into<String>) -> Self {
        self.reply_to_id = Some(reply_to_id.into());
        self
    }

    /// Adds an attachment.
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Returns the conversation id, if present and non-empty.
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation
            .as_ref()
            .map(|conversation| conversation.id.as_str())
            .filter(|id| !id.is_empty())
    }

    /// Returns `true` for `invoke` activities.
    pub fn is_invoke(&self) -> bool {
        self.activity_type == activity_types::INVOKE
    }

    /// Removes stream-backed attachments, returning them as content streams
    /// in their original order. Inline attachments stay in place.
    pub fn take_stream_attachments(&mut self) -> Vec<ContentStream> {
        let (streams, inline): (Vec<_>, Vec<_>) = std::mem::take(&mut self.attachments)
            .into_iter()
            .partition(|attachment| matches!(attachment.content, Some(AttachmentContent::Stream(_))));
        self.attachments = inline;

        streams
            .into_iter()
            .filter_map(|attachment| match attachment.content {
                Some(AttachmentContent::Stream(data)) => {
                    Some(ContentStream::new(attachment.content_type, data))
                }
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_members_round_trip() {
        let value = json!({
            "type": "message",
            "text": "hello",
            "from": { "id": "user" },
            "conversation": { "id": "c1", "isGroup": true },
            "channelData": { "tenant": "t" }
        });

        let activity: Activity = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(activity.conversation_id(), Some("c1"));
        assert_eq!(activity.extra.len(), 3);

        assert_eq!(serde_json::to_value(&activity).unwrap(), value);
    }

    #[test]
    fn test_empty_conversation_id_is_none() {
        let activity: Activity = serde_json::from_str(r#"{"conversation":{"id":""}}"#).unwrap();
        assert_eq!(activity.conversation_id(), None);

        let activity: Activity = serde_json::from_str("{}").unwrap();
        assert_eq!(activity.conversation_id(), None);
    }

    #[test]
    fn test_null_members_read_as_defaults() {
        let activity: Activity = serde_json::from_str(
            r#"{"type":null,"conversation":{"id":null},"attachments":null,"replyToId":null}"#,
        )
        .unwrap();

        assert!(activity.activity_type.is_empty());
        assert!(activity.attachments.is_empty());
        assert_eq!(activity.reply_to_id, None);
        assert_eq!(activity.conversation_id(), None);
    }

    #[test]
    fn test_take_stream_attachments() {
        let mut activity = Activity::new(activity_types::MESSAGE, "c1")
            .with_attachment(Attachment::inline("application/json", json!({"a": 1})))
            .with_attachment(Attachment::stream("image/png", vec![1, 2]))
            .with_attachment(Attachment::stream("text/plain", b"hi".to_vec()));

        let streams = activity.take_stream_attachments();

        assert_eq!(streams.len(), 2);
        assert_eq!(streams[0].content_type.as_deref(), Some("image/png"));
        assert_eq!(streams[0].data, vec![1, 2]);
        assert_eq!(streams[1].data, b"hi");
        assert_eq!(activity.attachments.len(), 1);
        assert!(activity.attachments[0].inline_content().is_some());
    }

    #[test]
    fn test_serialized_field_names() {
        let activity = Activity::new(activity_types::INVOKE, "c1")
            .with_service_url("urn:test:wss:host")
            .with_reply_to_id("r1");
        let value = serde_json::to_value(&activity).unwrap();

        assert_eq!(value["type"], "invoke");
        assert_eq!(value["serviceUrl"], "urn:test:wss:host");
        assert_eq!(value["replyToId"], "r1");
        assert!(value.get("attachments").is_none());
        assert!(value.get("callerId").is_none());
        assert!(activity.is_invoke());
    }
}
