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

use crate::StreamingError;
use crate::handler::{
    Bot, ConversationAffinity, StreamingActivityProcessor, caller_id_from_audience, user_agent,
};
use crate::protocol::{GET, POST, StreamingRequest, StreamingResponse};
use crate::schema::{Activity, Attachment, InvokeResponse, ResourceResponse, VersionInfo};
use crate::session::{RequestHandler, StreamingConnection};
use crate::transport::{TransportError, TransportId};
use async_trait::async_trait;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const VERSION_PATH: &str = "/api/version";
const MALFORMED_BODY: &str = "Request body missing or malformed";

/// Bridges one streaming connection and a bot.
///
/// Inbound requests are turned into activities and run through the bot;
/// outbound activities are turned into requests on the same connection. The
/// handler also remembers which conversations arrived on its connection, so
/// a router can send proactive messages down the right pipe.
///
/// # Examples
///
/// ```rust
/// use botstream::handler::{DirectProcessor, StreamingRequestHandler};
/// # use botstream::handler::Bot;
/// use botstream::session::{ConnectionConfig, StreamingConnection};
/// use botstream::transport::MemoryTransport;
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example(bot: Arc<dyn Bot>) -> Result<(), botstream::StreamingError> {
/// let (transport, _peer) = MemoryTransport::pair_default();
/// let connection = Arc::new(StreamingConnection::new(transport, ConnectionConfig::default()));
/// let handler = Arc::new(StreamingRequestHandler::new(
///     bot,
///     Arc::new(DirectProcessor),
///     connection,
///     Some("https://api.botframework.com".to_string()),
/// ));
///
/// // Runs until the peer disconnects
/// handler.listen(CancellationToken::new()).await
/// # }
/// ```
pub struct StreamingRequestHandler {
    bot: Arc<dyn Bot>,
    processor: Arc<dyn StreamingActivityProcessor>,
    connection: Arc<StreamingConnection>,
    audience: Option<String>,
    service_url: OnceLock<String>,
    affinity: ConversationAffinity,
}

impl StreamingRequestHandler {
    /// Creates a handler for `connection`.
    ///
    /// `audience` is the scope outgoing activities are addressed to; it
    /// determines the `callerId` stamped on inbound activities.
    pub fn new(
        bot: Arc<dyn Bot>,
        processor: Arc<dyn StreamingActivityProcessor>,
        connection: Arc<StreamingConnection>,
        audience: Option<String>,
    ) -> Self {
        Self {
            bot,
            processor,
            connection,
            audience: audience.filter(|audience| !audience.is_empty()),
            service_url: OnceLock::new(),
            affinity: ConversationAffinity::new(),
        }
    }

    /// Reads requests from the connection until it disconnects.
    pub async fn listen(self: &Arc<Self>, cancel: CancellationToken) -> Result<(), StreamingError> {
        let handler: Arc<dyn RequestHandler> = Arc::clone(self) as Arc<dyn RequestHandler>;
        self.connection.listen(handler, cancel).await
    }

    /// Returns the id of the underlying transport.
    pub fn id(&self) -> TransportId {
        self.connection.id()
    }

    /// Returns the underlying connection.
    pub fn connection(&self) -> &Arc<StreamingConnection> {
        &self.connection
    }

    /// Returns the configured audience.
    pub fn audience(&self) -> Option<&str> {
        self.audience.as_deref()
    }

    /// Returns `true` until the connection has disconnected.
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Returns the service URL of the first activity received, if any.
    pub fn service_url(&self) -> Option<&str> {
        self.service_url.get().map(String::as_str)
    }

    /// Sets the service URL unless one is already latched.
    ///
    /// Returns `true` if this call set it.
    pub fn latch_service_url(&self, service_url: &str) -> bool {
        !service_url.is_empty() && self.service_url.set(service_url.to_string()).is_ok()
    }

    /// Returns `true` if the conversation has arrived on this connection.
    pub fn has_conversation(&self, conversation_id: &str) -> bool {
        self.affinity.contains(conversation_id)
    }

    /// Returns when the conversation first arrived on this connection.
    pub fn conversation_added_time(&self, conversation_id: &str) -> Option<Instant> {
        self.affinity.added_time(conversation_id)
    }

    /// Records a conversation as belonging to this connection.
    pub fn remember_conversation(&self, conversation_id: &str) -> bool {
        self.affinity.insert_if_absent(conversation_id)
    }

    /// Stops routing the conversation to this connection.
    pub fn forget_conversation(&self, conversation_id: &str) {
        if self.affinity.forget(conversation_id) {
            self.connection.metrics().record_conversation_forgotten();
            debug!(
                transport_id = %self.id(),
                conversation_id = conversation_id,
                "Forgot conversation"
            );
        }
    }

    /// Returns the conversations recorded on this connection.
    pub fn conversations(&self) -> Vec<String> {
        self.affinity.ids()
    }

    /// Sends an activity to the channel on the other end of the connection.
    ///
    /// Stream-backed attachments are moved out of the activity body and sent
    /// as additional streams in attachment order.
    ///
    /// # Errors
    ///
    /// Returns [`StreamingError::Disconnected`] without any I/O if the
    /// connection is gone. A non-200 status, a transport failure or
    /// cancellation while in flight is logged and returned as `Ok(None)`.
    pub async fn send_activity(
        &self,
        mut activity: Activity,
        cancel: CancellationToken,
    ) -> Result<Option<ResourceResponse>, StreamingError> {
        if !self.is_connected() {
            return Err(StreamingError::Disconnected);
        }

        let conversation_id = activity.conversation_id().unwrap_or_default().to_string();
        let path = match activity
            .reply_to_id
            .as_deref()
            .filter(|reply_to_id| !reply_to_id.trim().is_empty())
        {
            Some(reply_to_id) => format!(
                "/v3/conversations/{}/activities/{}",
                conversation_id, reply_to_id
            ),
            None => format!("/v3/conversations/{}/activities", conversation_id),
        };

        let streams = activity.take_stream_attachments();
        let mut request = StreamingRequest::create_post(path);
        request.set_body_json(&activity)?;
        for stream in streams {
            request.add_stream(stream);
        }

        let Some(response) = self.send(&request, cancel).await? else {
            return Ok(None);
        };
        if response.status_code != 200 {
            self.connection.metrics().record_send_failure();
            warn!(
                transport_id = %self.id(),
                status = response.status_code,
                path = %request.path,
                "Failed to send activity through streaming transport"
            );
            return Ok(None);
        }

        self.connection.metrics().record_activity_sent();
        match response.body() {
            Some(body) if !body.is_empty() => match body.read_as_json::<ResourceResponse>() {
                Ok(resource) => Ok(Some(resource)),
                Err(error) => {
                    warn!(transport_id = %self.id(), error = %error, "Unreadable resource response");
                    Ok(None)
                }
            },
            _ => Ok(Some(ResourceResponse::default())),
        }
    }

    /// Sends an arbitrary request over the connection.
    ///
    /// # Errors
    ///
    /// Returns [`StreamingError::Disconnected`] if the connection is gone.
    /// Transport failures and cancellation are logged and returned as
    /// `Ok(None)`.
    pub async fn send_streaming_request(
        &self,
        request: StreamingRequest,
        cancel: CancellationToken,
    ) -> Result<Option<StreamingResponse>, StreamingError> {
        if !self.is_connected() {
            return Err(StreamingError::Disconnected);
        }
        self.send(&request, cancel).await
    }

    async fn send(
        &self,
        request: &StreamingRequest,
        cancel: CancellationToken,
    ) -> Result<Option<StreamingResponse>, StreamingError> {
        match self.connection.send_request(request, cancel).await {
            Ok(response) => Ok(Some(response)),
            Err(StreamingError::Transport(TransportError::NotConnected)) => {
                Err(StreamingError::Disconnected)
            }
            Err(error) => {
                self.connection.metrics().record_send_failure();
                warn!(
                    transport_id = %self.id(),
                    path = %request.path,
                    error = %error,
                    "Streaming request failed"
                );
                Ok(None)
            }
        }
    }

    fn process_control_request(&self, request: &StreamingRequest) -> StreamingResponse {
        if request.verb.is_empty() || request.path.is_empty() {
            error!(transport_id = %self.id(), "Request missing verb and/or path");
            return StreamingResponse::bad_request();
        }

        if request.verb.eq_ignore_ascii_case(GET) && request.path.eq_ignore_ascii_case(VERSION_PATH) {
            let info = VersionInfo {
                user_agent: user_agent().to_string(),
            };
            return match StreamingResponse::ok().with_json(&info) {
                Ok(response) => response,
                Err(error) => {
                    StreamingResponse::internal_server_error().with_text(error.to_string())
                }
            };
        }

        warn!(
            transport_id = %self.id(),
            verb = %request.verb,
            path = %request.path,
            "Unknown control request"
        );
        StreamingResponse::bad_request()
    }

    async fn run_bot(
        &self,
        activity: Activity,
        cancel: CancellationToken,
    ) -> Result<Option<InvokeResponse>, StreamingError> {
        let bot = Arc::clone(&self.bot);
        let processor = Arc::clone(&self.processor);
        let token = cancel.clone();
        let mut turn = tokio::spawn(async move {
            processor
                .process_streaming_activity(activity, bot.as_ref(), token)
                .await
        });

        tokio::select! {
            joined = &mut turn => match joined {
                Ok(result) => result.map_err(StreamingError::Bot),
                Err(error) => Err(StreamingError::Bot(Box::new(error))),
            },
            _ = cancel.cancelled() => {
                turn.abort();
                Err(StreamingError::Cancelled)
            }
        }
    }
}

#[async_trait]
impl RequestHandler for StreamingRequestHandler {
    async fn process_request(
        &self,
        request: StreamingRequest,
        cancel: CancellationToken,
    ) -> StreamingResponse {
        if !request.verb.eq_ignore_ascii_case(POST) {
            return self.process_control_request(&request);
        }

        let body = match request.body().map(|body| body.read_as_string()) {
            Some(Ok(body)) => body,
            _ => {
                error!(transport_id = %self.id(), "Request body missing or not UTF-8");
                return StreamingResponse::bad_request().with_text(MALFORMED_BODY);
            }
        };
        let json = body.trim_start_matches('\u{feff}');

        let mut activity: Activity = match serde_json::from_str(json) {
            Ok(activity) => activity,
            Err(error) => {
                error!(transport_id = %self.id(), error = %error, "{}", MALFORMED_BODY);
                return StreamingResponse::bad_request().with_text(MALFORMED_BODY);
            }
        };

        if let Some(service_url) = activity.service_url.as_deref() {
            self.latch_service_url(service_url);
        }

        let Some(conversation_id) = activity.conversation_id().map(str::to_string) else {
            warn!(transport_id = %self.id(), "Activity has no conversation id");
            return StreamingResponse::bad_request()
                .with_text(format!("conversationId is null. Body: {}", body));
        };

        if self.affinity.insert_if_absent(&conversation_id) {
            debug!(
                transport_id = %self.id(),
                conversation_id = %conversation_id,
                "Conversation joined connection"
            );
        }

        activity.attachments.extend(
            request
                .streams
                .into_iter()
                .skip(1)
                .map(|stream| Attachment::from_stream(stream.content_type, stream.data)),
        );
        activity.caller_id = caller_id_from_audience(self.audience.as_deref());

        info!(
            transport_id = %self.id(),
            conversation_id = %conversation_id,
            activity_type = %activity.activity_type,
            "Processing activity"
        );

        match self.run_bot(activity, cancel).await {
            Ok(None) => StreamingResponse::ok(),
            Ok(Some(invoke)) => {
                let response = StreamingResponse::new(invoke.status);
                match invoke.body {
                    Some(body) => response.with_json(&body).unwrap_or_else(|error| {
                        StreamingResponse::internal_server_error().with_text(error.to_string())
                    }),
                    None => response,
                }
            }
            Err(error) => {
                error!(
                    transport_id = %self.id(),
                    conversation_id = %conversation_id,
                    error = %error,
                    "Bot failed to process activity"
                );
                StreamingResponse::internal_server_error().with_text(error.to_string())
            }
        }
    }
}

impl std::fmt::Debug for StreamingRequestHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingRequestHandler")
            .field("connection", &self.connection)
            .field("audience", &self.audience)
            .field("service_url", &self.service_url.get())
            .field("conversations", &self.affinity.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BotError;
    use crate::handler::DirectProcessor;
    use crate::protocol::ContentStream;
    use crate::session::ConnectionConfig;
    use crate::transport::MemoryTransport;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingBot {
        turns: Mutex<Vec<Activity>>,
        result: Option<InvokeResponse>,
    }

    #[async_trait]
    impl Bot for RecordingBot {
        async fn on_turn(
            &self,
            activity: Activity,
            _cancel: CancellationToken,
        ) -> Result<Option<InvokeResponse>, BotError> {
            self.turns.lock().push(activity);
            Ok(self.result.clone())
        }
    }

    struct FailingBot;

    #[async_trait]
    impl Bot for FailingBot {
        async fn on_turn(
            &self,
            _activity: Activity,
            _cancel: CancellationToken,
        ) -> Result<Option<InvokeResponse>, BotError> {
            Err("storage unavailable".into())
        }
    }

    /// Signals once its turn starts, then never finishes.
    #[derive(Default)]
    struct StuckBot {
        started: tokio::sync::Notify,
    }

    #[async_trait]
    impl Bot for StuckBot {
        async fn on_turn(
            &self,
            _activity: Activity,
            _cancel: CancellationToken,
        ) -> Result<Option<InvokeResponse>, BotError> {
            self.started.notify_one();
            std::future::pending().await
        }
    }

    fn handler_with(bot: Arc<dyn Bot>, audience: Option<&str>) -> StreamingRequestHandler {
        let (transport, _peer) = MemoryTransport::pair_default();
        let connection = Arc::new(StreamingConnection::new(transport, ConnectionConfig::default()));
        StreamingRequestHandler::new(
            bot,
            Arc::new(DirectProcessor),
            connection,
            audience.map(str::to_string),
        )
    }

    fn post(body: &str) -> StreamingRequest {
        let mut request = StreamingRequest::create_post("/api/messages");
        request.set_body(ContentStream::text(body));
        request
    }

    #[tokio::test]
    async fn test_valid_activity_returns_200() {
        let bot = Arc::new(RecordingBot::default());
        let handler = handler_with(bot.clone(), None);

        let body = json!({
            "type": "message",
            "conversation": { "id": "c1" },
            "serviceUrl": "urn:test:wss:localhost"
        });
        let response = handler
            .process_request(post(&body.to_string()), CancellationToken::new())
            .await;

        assert_eq!(response.status_code, 200);
        assert!(response.streams.is_empty());
        assert_eq!(bot.turns.lock().len(), 1);
        assert_eq!(handler.service_url(), Some("urn:test:wss:localhost"));
        assert!(handler.has_conversation("c1"));
    }

    #[tokio::test]
    async fn test_malformed_body_returns_400() {
        let bot = Arc::new(RecordingBot::default());
        let handler = handler_with(bot.clone(), None);

        let response = handler
            .process_request(post("{not json"), CancellationToken::new())
            .await;

        assert_eq!(response.status_code, 400);
        assert_eq!(response.body_as_string().as_deref(), Some(MALFORMED_BODY));
        assert!(bot.turns.lock().is_empty());
        assert!(handler.conversations().is_empty());
    }

    #[tokio::test]
    async fn test_missing_body_returns_400() {
        let bot = Arc::new(RecordingBot::default());
        let handler = handler_with(bot.clone(), None);

        let response = handler
            .process_request(StreamingRequest::create_post("/api/messages"), CancellationToken::new())
            .await;
        assert_eq!(response.status_code, 400);

        let mut request = StreamingRequest::create_post("/api/messages");
        request.set_body(ContentStream::new(None, vec![0xff, 0xfe]));
        let response = handler.process_request(request, CancellationToken::new()).await;
        assert_eq!(response.status_code, 400);
        assert!(bot.turns.lock().is_empty());
    }

    #[tokio::test]
    async fn test_missing_conversation_returns_400() {
        let bot = Arc::new(RecordingBot::default());
        let handler = handler_with(bot.clone(), None);

        let body = r#"{"type":"message"}"#;
        let response = handler.process_request(post(body), CancellationToken::new()).await;

        assert_eq!(response.status_code, 400);
        assert_eq!(
            response.body_as_string(),
            Some(format!("conversationId is null. Body: {}", body))
        );
        assert!(bot.turns.lock().is_empty());
    }

    #[tokio::test]
    async fn test_null_members_are_accepted() {
        let bot = Arc::new(RecordingBot::default());
        let handler = handler_with(bot.clone(), None);

        for body in [
            r#"{"type":"message","conversation":{"id":"c1"},"attachments":null}"#,
            r#"{"type":null,"conversation":{"id":"c1"},"serviceUrl":null}"#,
        ] {
            let response = handler.process_request(post(body), CancellationToken::new()).await;
            assert_eq!(response.status_code, 200, "body: {}", body);
        }
        assert_eq!(bot.turns.lock().len(), 2);
        assert_eq!(handler.service_url(), None);
    }

    #[tokio::test]
    async fn test_null_conversation_id_returns_400() {
        let bot = Arc::new(RecordingBot::default());
        let handler = handler_with(bot.clone(), None);

        let body = r#"{"type":"message","conversation":{"id":null}}"#;
        let response = handler.process_request(post(body), CancellationToken::new()).await;

        assert_eq!(response.status_code, 400);
        assert_eq!(
            response.body_as_string(),
            Some(format!("conversationId is null. Body: {}", body))
        );
        assert!(bot.turns.lock().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_aborts_pending_turn() {
        let bot = Arc::new(StuckBot::default());
        let handler = Arc::new(handler_with(bot.clone(), None));
        let cancel = CancellationToken::new();

        let task = tokio::spawn({
            let handler = Arc::clone(&handler);
            let cancel = cancel.clone();
            async move {
                let body = r#"{"type":"message","conversation":{"id":"c1"}}"#;
                handler.process_request(post(body), cancel).await
            }
        });

        bot.started.notified().await;
        cancel.cancel();

        let response = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("handler did not return after cancellation")
            .unwrap();
        assert_eq!(response.status_code, 500);
        assert_eq!(handler.conversations(), vec!["c1".to_string()]);
    }

    #[tokio::test]
    async fn test_bom_is_ignored() {
        let bot = Arc::new(RecordingBot::default());
        let handler = handler_with(bot.clone(), None);

        let body = "\u{feff}{\"type\":\"message\",\"conversation\":{\"id\":\"c1\"}}";
        let response = handler.process_request(post(body), CancellationToken::new()).await;
        assert_eq!(response.status_code, 200);
    }

    #[tokio::test]
    async fn test_invoke_result_sets_status_and_body() {
        let bot = Arc::new(RecordingBot {
            result: Some(InvokeResponse::new(202).with_body(json!({"ok": true}))),
            ..Default::default()
        });
        let handler = handler_with(bot, None);

        let body = r#"{"type":"invoke","conversation":{"id":"c1"}}"#;
        let response = handler.process_request(post(body), CancellationToken::new()).await;

        assert_eq!(response.status_code, 202);
        let value: serde_json::Value = response.body_as_json().unwrap().unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_bot_error_returns_500() {
        let handler = handler_with(Arc::new(FailingBot), None);

        let body = r#"{"type":"message","conversation":{"id":"c1"}}"#;
        let response = handler.process_request(post(body), CancellationToken::new()).await;

        assert_eq!(response.status_code, 500);
        assert!(response.body_as_string().unwrap().contains("storage unavailable"));
    }

    #[tokio::test]
    async fn test_extra_streams_become_attachments_and_caller_id_is_set() {
        let bot = Arc::new(RecordingBot::default());
        let handler = handler_with(bot.clone(), Some("https://api.botframework.us"));

        let mut request = post(r#"{"type":"message","conversation":{"id":"c1"},"attachments":[{"contentType":"x","content":1}]}"#);
        request.add_stream(ContentStream::new(Some("image/png".to_string()), vec![1, 2, 3]));

        let response = handler.process_request(request, CancellationToken::new()).await;
        assert_eq!(response.status_code, 200);

        let turns = bot.turns.lock();
        let activity = &turns[0];
        assert_eq!(activity.caller_id.as_deref(), Some("us-gov-channel"));
        assert_eq!(activity.attachments.len(), 2);
        assert_eq!(activity.attachments[1].content_type.as_deref(), Some("image/png"));
        assert_eq!(activity.attachments[1].stream_content(), Some(&[1u8, 2, 3][..]));
    }

    #[tokio::test]
    async fn test_service_url_is_latched_once() {
        let handler = handler_with(Arc::new(RecordingBot::default()), None);

        for url in ["urn:a:wss:first", "urn:a:wss:second"] {
            let body = json!({"type": "message", "conversation": {"id": "c"}, "serviceUrl": url});
            handler
                .process_request(post(&body.to_string()), CancellationToken::new())
                .await;
        }
        assert_eq!(handler.service_url(), Some("urn:a:wss:first"));
    }

    #[tokio::test]
    async fn test_version_request() {
        let bot = Arc::new(RecordingBot::default());
        let handler = handler_with(bot.clone(), None);

        let response = handler
            .process_request(StreamingRequest::create_get("/api/version"), CancellationToken::new())
            .await;

        assert_eq!(response.status_code, 200);
        let info: VersionInfo = response.body_as_json().unwrap().unwrap();
        assert_eq!(info.user_agent, user_agent());
        assert!(bot.turns.lock().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_control_request_returns_400() {
        let handler = handler_with(Arc::new(RecordingBot::default()), None);

        let response = handler
            .process_request(StreamingRequest::create_get("/api/unknown"), CancellationToken::new())
            .await;
        assert_eq!(response.status_code, 400);

        let response = handler
            .process_request(StreamingRequest::new("", ""), CancellationToken::new())
            .await;
        assert_eq!(response.status_code, 400);
    }

    #[tokio::test]
    async fn test_send_on_disconnected_handler_fails_fast() {
        let handler = handler_with(Arc::new(RecordingBot::default()), None);
        handler.connection().disconnect().await;

        let result = handler
            .send_activity(Activity::new("message", "c1"), CancellationToken::new())
            .await;
        assert!(matches!(result, Err(StreamingError::Disconnected)));

        let result = handler
            .send_streaming_request(StreamingRequest::create_get("/"), CancellationToken::new())
            .await;
        assert!(matches!(result, Err(StreamingError::Disconnected)));
    }

    #[tokio::test]
    async fn test_forget_conversation() {
        let handler = handler_with(Arc::new(RecordingBot::default()), None);
        assert!(handler.remember_conversation("c1"));
        assert!(handler.conversation_added_time("c1").is_some());

        handler.forget_conversation("c1");
        assert!(!handler.has_conversation("c1"));
        assert_eq!(handler.connection().metrics().conversations_forgotten(), 1);
    }
}
