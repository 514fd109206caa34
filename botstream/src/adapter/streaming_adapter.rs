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
use crate::adapter::{AdapterConfig, StreamingServiceUrl};
use crate::error::BotError;
use crate::handler::{
    Bot, StreamingActivityProcessor, StreamingRequestHandler, audience_from_caller_id,
};
use crate::observability::StreamingMetrics;
use crate::protocol::{StreamingRequest, StreamingResponse};
use crate::schema::{Activity, InvokeResponse, ResourceResponse};
use crate::session::StreamingConnection;
use crate::transport::{Transport, TransportError, TransportId};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type HandlerList = Arc<RwLock<Vec<Arc<StreamingRequestHandler>>>>;

#[derive(Clone)]
struct ConnectedBot {
    bot: Arc<dyn Bot>,
    audience: Option<String>,
}

/// Owns the live request handlers and routes outbound activities to them.
///
/// Every connection the adapter accepts or opens gets a
/// [`StreamingRequestHandler`] in its registry. When the bot sends a
/// proactive activity, [`route_and_send`](Self::route_and_send) finds the
/// connection the conversation arrived on. If a channel reconnected and the
/// conversation shows up on several connections, the newest claim wins and
/// the others forget it. If no connection owns it, the adapter dials the
/// channel itself.
///
/// # Examples
///
/// ```rust,no_run
/// use botstream::adapter::{AdapterConfig, StreamingAdapter};
/// use botstream::schema::Activity;
/// # use botstream::handler::Bot;
/// use tokio_util::sync::CancellationToken;
/// # use std::sync::Arc;
///
/// # async fn example(bot: Arc<dyn Bot>) -> Result<(), botstream::StreamingError> {
/// let adapter = Arc::new(StreamingAdapter::new(AdapterConfig::default()));
///
/// let runner = Arc::clone(&adapter);
/// tokio::spawn(async move { runner.connect_named_pipe("bfv4.pipes", bot, None).await });
///
/// let activity = Activity::new("message", "conversation-1")
///     .with_service_url("urn:botframework:namedpipe:bfv4.pipes");
/// let sent = adapter.route_and_send(activity, CancellationToken::new()).await?;
/// println!("delivered: {}", sent.is_some());
/// # Ok(())
/// # }
/// ```
pub struct StreamingAdapter {
    config: AdapterConfig,
    handlers: HandlerList,
    connected_bot: RwLock<Option<ConnectedBot>>,
    processor: Arc<AdapterProcessor>,
    metrics: Arc<StreamingMetrics>,
    shutdown: CancellationToken,
}

impl StreamingAdapter {
    /// Creates an adapter with no handlers.
    pub fn new(config: AdapterConfig) -> Self {
        Self {
            config,
            handlers: Arc::new(RwLock::new(Vec::new())),
            connected_bot: RwLock::new(None),
            processor: Arc::new(AdapterProcessor),
            metrics: Arc::new(StreamingMetrics::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Returns the adapter configuration.
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Returns metrics shared by every connection the adapter creates.
    pub fn metrics(&self) -> &Arc<StreamingMetrics> {
        &self.metrics
    }

    /// Sets the bot used for connections the adapter opens itself.
    ///
    /// Without one, proactive sends to conversations no connection owns are
    /// dropped.
    pub fn set_connected_bot(&self, bot: Arc<dyn Bot>, audience: Option<String>) {
        *self.connected_bot.write() = Some(ConnectedBot { bot, audience });
    }

    /// Returns `true` if a bot is set for proactive connections.
    pub fn has_connected_bot(&self) -> bool {
        self.connected_bot.read().is_some()
    }

    /// Adds a handler to the registry.
    pub fn register_handler(&self, handler: Arc<StreamingRequestHandler>) {
        debug!(transport_id = %handler.id(), "Registered request handler");
        self.handlers.write().push(handler);
    }

    /// Removes a handler from the registry.
    pub fn unregister_handler(&self, id: TransportId) -> bool {
        remove_handler(&self.handlers, id)
    }

    /// Returns a snapshot of the registered handlers.
    pub fn handlers(&self) -> Vec<Arc<StreamingRequestHandler>> {
        self.handlers.read().clone()
    }

    /// Returns the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Creates a handler for `transport` without registering it.
    ///
    /// The handler runs its bot through this adapter's processor.
    pub fn create_handler<T: Transport>(
        &self,
        transport: T,
        bot: Arc<dyn Bot>,
        audience: Option<String>,
    ) -> Arc<StreamingRequestHandler> {
        let connection = StreamingConnection::with_metrics(
            transport,
            self.config.connection.clone(),
            Arc::clone(&self.metrics),
        );
        let processor: Arc<dyn StreamingActivityProcessor> = self.processor.clone();
        Arc::new(StreamingRequestHandler::new(
            bot,
            processor,
            Arc::new(connection),
            audience,
        ))
    }

    /// Serves an already established transport.
    ///
    /// The handler is registered and listens on a background task, which
    /// unregisters it when the connection ends.
    pub fn accept_connection<T: Transport>(
        &self,
        transport: T,
        bot: Arc<dyn Bot>,
        audience: Option<String>,
    ) -> (
        Arc<StreamingRequestHandler>,
        JoinHandle<Result<(), StreamingError>>,
    ) {
        let handler = self.create_handler(transport, bot, audience);
        self.register_handler(Arc::clone(&handler));
        let task = self.spawn_listener(Arc::clone(&handler));
        info!(transport_id = %handler.id(), "Accepted streaming connection");
        (handler, task)
    }

    /// Connects to a named pipe and serves it until it disconnects.
    ///
    /// `bot` also becomes the bot for proactive connections.
    #[cfg(all(feature = "named-pipe", any(unix, windows)))]
    pub async fn connect_named_pipe(
        &self,
        pipe_name: &str,
        bot: Arc<dyn Bot>,
        audience: Option<String>,
    ) -> Result<(), StreamingError> {
        if pipe_name.is_empty() {
            return Err(TransportError::InvalidConfiguration {
                reason: "pipe name must not be empty".to_string(),
            }
            .into());
        }

        self.set_connected_bot(Arc::clone(&bot), audience.clone());
        let transport = crate::transport::NamedPipeTransport::connect(pipe_name).await?;
        let handler = self.create_handler(transport, bot, audience);
        self.register_handler(Arc::clone(&handler));
        info!(transport_id = %handler.id(), pipe_name = pipe_name, "Connected named pipe");

        let result = handler.listen(self.shutdown.child_token()).await;
        self.unregister_handler(handler.id());
        result
    }

    /// Finds the handler an inbound activity arrived on.
    ///
    /// Matches service URL, the audience implied by the activity's
    /// `callerId`, and conversation. The most recently registered match wins.
    pub fn handler_for_activity(&self, activity: &Activity) -> Option<Arc<StreamingRequestHandler>> {
        let service_url = activity.service_url.as_deref()?;
        let conversation_id = activity.conversation_id()?;
        let audience = audience_from_caller_id(activity.caller_id.as_deref());

        self.handlers
            .read()
            .iter()
            .filter(|handler| {
                handler.service_url() == Some(service_url)
                    && handler.audience() == audience.as_deref()
                    && handler.has_conversation(conversation_id)
            })
            .next_back()
            .cloned()
    }

    /// Sends a Connector API request down the connection `activity` arrived on.
    ///
    /// Returns `Ok(None)` if no connection matches.
    pub async fn send_connector_request(
        &self,
        activity: &Activity,
        request: StreamingRequest,
        cancel: CancellationToken,
    ) -> Result<Option<StreamingResponse>, StreamingError> {
        match self.handler_for_activity(activity) {
            Some(handler) => handler.send_streaming_request(request, cancel).await,
            None => {
                warn!(
                    service_url = ?activity.service_url,
                    conversation_id = ?activity.conversation_id(),
                    "No streaming connection for connector request"
                );
                Ok(None)
            }
        }
    }

    /// Sends an activity down the connection that owns its conversation.
    ///
    /// # Errors
    ///
    /// - [`StreamingError::Disconnected`] if the owning connection is gone
    /// - [`StreamingError::InvalidServiceUrl`] if a new connection is needed
    ///   but the service URL is not a streaming URL
    /// - [`StreamingError::Transport`] if opening a new connection fails
    ///
    /// Returns `Ok(None)` when no connection owns the conversation and no
    /// bot is set for proactive connections.
    pub async fn route_and_send(
        &self,
        activity: Activity,
        cancel: CancellationToken,
    ) -> Result<Option<ResourceResponse>, StreamingError> {
        let conversation_id = activity.conversation_id().map(str::to_string);
        let candidates = match (activity.service_url.as_deref(), conversation_id.as_deref()) {
            (Some(service_url), Some(conversation_id)) => {
                self.candidates(service_url, conversation_id)
            }
            _ => Vec::new(),
        };

        match candidates.len() {
            0 => self.send_proactive(activity, cancel).await,
            1 => candidates[0].send_activity(activity, cancel).await,
            _ => {
                let conversation_id = conversation_id.unwrap_or_default();
                let canonical = self.resolve_duplicates(&candidates, &conversation_id);
                canonical.send_activity(activity, cancel).await
            }
        }
    }

    /// Stops every listen loop started by this adapter.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn candidates(
        &self,
        service_url: &str,
        conversation_id: &str,
    ) -> Vec<Arc<StreamingRequestHandler>> {
        let mut snapshot = self.handlers();

        if self.config.prune_disconnected {
            let before = snapshot.len();
            snapshot.retain(|handler| handler.is_connected());
            if snapshot.len() != before {
                let mut handlers = self.handlers.write();
                handlers.retain(|handler| handler.is_connected());
                debug!(
                    pruned = before - snapshot.len(),
                    remaining = handlers.len(),
                    "Pruned disconnected handlers"
                );
            }
        }

        snapshot
            .into_iter()
            .filter(|handler| {
                handler.service_url() == Some(service_url) && handler.has_conversation(conversation_id)
            })
            .collect()
    }

    /// Picks the handler with the newest claim on the conversation and makes
    /// every other handler forget it. Ties go to the later registration.
    fn resolve_duplicates(
        &self,
        candidates: &[Arc<StreamingRequestHandler>],
        conversation_id: &str,
    ) -> Arc<StreamingRequestHandler> {
        let (canonical, _) = candidates
            .iter()
            .enumerate()
            .map(|(index, handler)| (index, handler.conversation_added_time(conversation_id)))
            .max_by_key(|(index, added)| (*added, *index))
            .unwrap_or((candidates.len() - 1, None));

        for (index, handler) in candidates.iter().enumerate() {
            if index != canonical {
                handler.forget_conversation(conversation_id);
            }
        }
        info!(
            conversation_id = conversation_id,
            transport_id = %candidates[canonical].id(),
            claims = candidates.len(),
            "Conversation moved to newer connection"
        );
        Arc::clone(&candidates[canonical])
    }

    async fn send_proactive(
        &self,
        activity: Activity,
        cancel: CancellationToken,
    ) -> Result<Option<ResourceResponse>, StreamingError> {
        let connected = self.connected_bot.read().clone();
        let Some(connected) = connected else {
            debug!(
                service_url = ?activity.service_url,
                conversation_id = ?activity.conversation_id(),
                "No connection owns conversation"
            );
            return Ok(None);
        };

        let raw_url = activity.service_url.clone().unwrap_or_default();
        let url = StreamingServiceUrl::parse(&raw_url)?;
        let connector = self.config.connector.clone().ok_or_else(|| {
            TransportError::InvalidConfiguration {
                reason: "no connector configured for proactive connections".to_string(),
            }
        })?;

        let endpoint = url.endpoint_url();
        info!(endpoint = %endpoint, "Opening proactive streaming connection");
        let transport = tokio::select! {
            transport = connector.connect(&endpoint) => transport?,
            _ = cancel.cancelled() => return Err(StreamingError::Cancelled),
        };

        let handler = self.create_handler(transport, connected.bot, connected.audience);
        handler.latch_service_url(&raw_url);
        if let Some(conversation_id) = activity.conversation_id() {
            handler.remember_conversation(conversation_id);
        }
        self.register_handler(Arc::clone(&handler));
        self.spawn_listener(Arc::clone(&handler));

        handler.send_activity(activity, cancel).await
    }

    fn spawn_listener(
        &self,
        handler: Arc<StreamingRequestHandler>,
    ) -> JoinHandle<Result<(), StreamingError>> {
        let handlers = Arc::clone(&self.handlers);
        let cancel = self.shutdown.child_token();
        tokio::spawn(async move {
            let result = handler.listen(cancel).await;
            remove_handler(&handlers, handler.id());
            result
        })
    }
}

impl Default for StreamingAdapter {
    fn default() -> Self {
        Self::new(AdapterConfig::default())
    }
}

impl std::fmt::Debug for StreamingAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingAdapter")
            .field("config", &self.config)
            .field("handlers", &self.handler_count())
            .field("connected_bot", &self.has_connected_bot())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl StreamingActivityProcessor for StreamingAdapter {
    async fn process_streaming_activity(
        &self,
        activity: Activity,
        bot: &dyn Bot,
        cancel: CancellationToken,
    ) -> Result<Option<InvokeResponse>, BotError> {
        self.processor
            .process_streaming_activity(activity, bot, cancel)
            .await
    }
}

/// Turn processing used by adapter-created handlers.
///
/// Kept apart from the adapter so handlers do not hold the adapter alive.
#[derive(Debug)]
struct AdapterProcessor;

#[async_trait]
impl StreamingActivityProcessor for AdapterProcessor {
    async fn process_streaming_activity(
        &self,
        activity: Activity,
        bot: &dyn Bot,
        cancel: CancellationToken,
    ) -> Result<Option<InvokeResponse>, BotError> {
        info!(
            activity_type = %activity.activity_type,
            activity_id = ?activity.id,
            conversation_id = ?activity.conversation_id(),
            "Received streaming activity"
        );

        let is_invoke = activity.is_invoke();
        let result = bot.on_turn(activity, cancel).await?;
        if is_invoke && result.is_none() {
            return Ok(Some(InvokeResponse::new(501)));
        }
        Ok(result)
    }
}

fn remove_handler(handlers: &RwLock<Vec<Arc<StreamingRequestHandler>>>, id: TransportId) -> bool {
    let mut handlers = handlers.write();
    let before = handlers.len();
    handlers.retain(|handler| handler.id() != id);
    let removed = handlers.len() != before;
    if removed {
        debug!(transport_id = %id, "Unregistered request handler");
    }
    removed
}
