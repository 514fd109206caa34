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

//! Integration tests for conversation routing in the adapter.

mod common;

use async_trait::async_trait;
use botstream::adapter::{AdapterConfig, StreamingAdapter};
use botstream::handler::StreamingActivityProcessor;
use botstream::protocol::StreamingRequest;
use botstream::schema::{Activity, ResourceResponse};
use botstream::transport::{MemoryTransport, Transport, TransportConnector, TransportError};
use botstream::StreamingError;
use common::{ChannelPeer, RecordingBot, message};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const SERVICE_URL: &str = "urn:test:wss:localhost:3978";

/// Connector handing out in-memory transports, with a channel peer on the
/// far end of each.
#[derive(Default)]
struct MemoryConnector {
    urls: Mutex<Vec<String>>,
    peers: Mutex<Vec<ChannelPeer>>,
}

#[async_trait]
impl TransportConnector for MemoryConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, TransportError> {
        self.urls.lock().push(url.to_string());
        let (local, remote) = MemoryTransport::pair_default();
        self.peers.lock().push(ChannelPeer::spawn(remote, "proactive"));
        Ok(Box::new(local))
    }
}

fn adapter(prune_disconnected: bool) -> Arc<StreamingAdapter> {
    Arc::new(StreamingAdapter::new(
        AdapterConfig::new().with_prune_disconnected(prune_disconnected),
    ))
}

/// Accepts a connection on the adapter and returns the channel end.
fn connect_channel(adapter: &StreamingAdapter, name: &str) -> ChannelPeer {
    let (bot_end, channel_end) = MemoryTransport::pair_default();
    adapter.accept_connection(bot_end, RecordingBot::new(), None);
    ChannelPeer::spawn(channel_end, name)
}

#[tokio::test]
async fn test_single_owner_receives_activity() {
    let adapter = adapter(true);
    let channel = connect_channel(&adapter, "only");
    channel.post_activity(&message("c1", SERVICE_URL)).await;

    let sent = adapter
        .route_and_send(message("c1", SERVICE_URL), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sent.and_then(|response| response.id).as_deref(), Some("only"));
    assert_eq!(channel.received_paths(), vec!["/v3/conversations/c1/activities"]);
}

#[tokio::test]
async fn test_newest_claim_wins_race() {
    let adapter = adapter(true);
    let first = connect_channel(&adapter, "first");
    let second = connect_channel(&adapter, "second");

    first.post_activity(&message("c1", SERVICE_URL)).await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    second.post_activity(&message("c1", SERVICE_URL)).await;

    let sent = adapter
        .route_and_send(message("c1", SERVICE_URL), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(sent.and_then(|response| response.id).as_deref(), Some("second"));

    let handlers = adapter.handlers();
    assert_eq!(handlers.len(), 2);
    assert!(!handlers[0].has_conversation("c1"));
    assert!(handlers[1].has_conversation("c1"));
    assert!(first.received_paths().is_empty());
    assert_eq!(adapter.metrics().conversations_forgotten(), 1);
}

#[tokio::test]
async fn test_service_url_must_match() {
    let adapter = adapter(true);
    let channel = connect_channel(&adapter, "only");
    channel.post_activity(&message("c1", SERVICE_URL)).await;

    let sent = adapter
        .route_and_send(message("c1", "urn:other:wss:elsewhere"), CancellationToken::new())
        .await
        .unwrap();
    assert!(sent.is_none());
    assert!(channel.received_paths().is_empty());
}

#[tokio::test]
async fn test_no_route_without_bot_is_none() {
    let adapter = adapter(true);

    let sent = adapter
        .route_and_send(message("unknown", SERVICE_URL), CancellationToken::new())
        .await
        .unwrap();
    assert!(sent.is_none());
}

#[tokio::test]
async fn test_disconnected_handlers_are_pruned() {
    let adapter = adapter(true);
    let (bot_end, _channel_end) = MemoryTransport::pair_default();
    let handler = adapter.create_handler(bot_end, RecordingBot::new(), None);
    handler.latch_service_url(SERVICE_URL);
    handler.remember_conversation("c1");
    adapter.register_handler(Arc::clone(&handler));

    handler.connection().disconnect().await;

    let sent = adapter
        .route_and_send(message("c1", SERVICE_URL), CancellationToken::new())
        .await
        .unwrap();
    assert!(sent.is_none());
    assert_eq!(adapter.handler_count(), 0);
}

#[tokio::test]
async fn test_disconnected_owner_fails_fast_without_pruning() {
    let adapter = adapter(false);
    let (bot_end, _channel_end) = MemoryTransport::pair_default();
    let handler = adapter.create_handler(bot_end, RecordingBot::new(), None);
    handler.latch_service_url(SERVICE_URL);
    handler.remember_conversation("c1");
    adapter.register_handler(Arc::clone(&handler));

    handler.connection().disconnect().await;

    let result = adapter
        .route_and_send(message("c1", SERVICE_URL), CancellationToken::new())
        .await;
    assert!(matches!(result, Err(StreamingError::Disconnected)));
    assert_eq!(adapter.handler_count(), 1);
}

#[tokio::test]
async fn test_proactive_connection_is_opened_and_reused() {
    let connector = Arc::new(MemoryConnector::default());
    let adapter = StreamingAdapter::new(AdapterConfig::new().with_connector(connector.clone()));
    adapter.set_connected_bot(RecordingBot::new(), None);

    for _ in 0..2 {
        let sent = adapter
            .route_and_send(message("c1", SERVICE_URL), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            sent,
            Some(ResourceResponse {
                id: Some("proactive".to_string())
            })
        );
    }

    assert_eq!(
        *connector.urls.lock(),
        vec!["wss://localhost:3978/api/messages".to_string()]
    );
    assert_eq!(adapter.handler_count(), 1);
    assert_eq!(connector.peers.lock()[0].received_paths().len(), 2);
}

#[tokio::test]
async fn test_proactive_connection_rejects_http_service_url() {
    let adapter = StreamingAdapter::new(
        AdapterConfig::new().with_connector(Arc::new(MemoryConnector::default())),
    );
    adapter.set_connected_bot(RecordingBot::new(), None);

    let result = adapter
        .route_and_send(
            message("c1", "https://smba.trafficmanager.net/"),
            CancellationToken::new(),
        )
        .await;
    assert!(matches!(result, Err(StreamingError::InvalidServiceUrl { .. })));
}

#[tokio::test]
async fn test_invoke_without_result_gets_501() {
    let adapter = adapter(true);
    let channel = connect_channel(&adapter, "channel");

    let invoke = Activity::new("invoke", "c1").with_service_url(SERVICE_URL);
    let response = channel.post_activity(&invoke).await;
    assert_eq!(response.status_code, 501);

    let response = channel.post_activity(&message("c1", SERVICE_URL)).await;
    assert_eq!(response.status_code, 200);
}

#[tokio::test]
async fn test_adapter_processor_directly() {
    let adapter = StreamingAdapter::default();
    let bot = RecordingBot::new();

    let result = adapter
        .process_streaming_activity(
            Activity::new("invoke", "c1"),
            bot.as_ref(),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(result.map(|response| response.status), Some(501));
    assert_eq!(bot.turn_count(), 1);
}

#[tokio::test]
async fn test_connector_request_uses_inbound_connection() {
    let adapter = adapter(true);
    let (bot_end, channel_end) = MemoryTransport::pair_default();
    adapter.accept_connection(
        bot_end,
        RecordingBot::new(),
        Some("https://api.botframework.com".to_string()),
    );
    let channel = ChannelPeer::spawn(channel_end, "channel");
    channel.post_activity(&message("c1", SERVICE_URL)).await;

    let mut inbound = message("c1", SERVICE_URL);
    inbound.caller_id = Some("public-azure-channel".to_string());
    assert!(adapter.handler_for_activity(&inbound).is_some());

    let response = adapter
        .send_connector_request(
            &inbound,
            StreamingRequest::create_get("/v3/conversations/c1/members"),
            CancellationToken::new(),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(channel.received_paths(), vec!["/v3/conversations/c1/members"]);

    // A different audience does not match
    inbound.caller_id = Some("us-gov-channel".to_string());
    assert!(adapter.handler_for_activity(&inbound).is_none());
}

#[tokio::test]
async fn test_closed_connection_is_unregistered() {
    let adapter = adapter(true);
    let (bot_end, channel_end) = MemoryTransport::pair_default();
    let (_handler, listening) = adapter.accept_connection(bot_end, RecordingBot::new(), None);
    assert_eq!(adapter.handler_count(), 1);

    drop(channel_end);
    listening.await.unwrap().unwrap();
    assert_eq!(adapter.handler_count(), 0);
}
