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

//! A bot connecting to its channel over a named pipe.

#![cfg(all(feature = "named-pipe", unix))]

mod common;

use botstream::StreamingAdapter;
use botstream::transport::{NamedPipeListener, TransportListener};
use common::{ChannelPeer, RecordingBot, message, wait_until};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_connect_named_pipe_serves_until_disconnect() {
    let name = format!("botstream-test-{}", uuid::Uuid::new_v4());
    let service_url = format!("urn:test:namedpipe:{}", name);
    let listener = NamedPipeListener::bind(&name).unwrap();

    let adapter = Arc::new(StreamingAdapter::default());
    let bot = RecordingBot::new();
    let runner = Arc::clone(&adapter);
    let pipe_name = name.clone();
    let bot_for_pipe = bot.clone();
    let serving =
        tokio::spawn(async move { runner.connect_named_pipe(&pipe_name, bot_for_pipe, None).await });

    let channel = ChannelPeer::spawn(listener.accept().await.unwrap(), "pipe-channel");
    wait_until(|| adapter.handler_count() == 1).await;
    assert!(adapter.has_connected_bot());

    let response = channel.post_activity(&message("c1", &service_url)).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(bot.turn_count(), 1);

    let sent = adapter
        .route_and_send(message("c1", &service_url), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(
        sent.and_then(|response| response.id).as_deref(),
        Some("pipe-channel")
    );

    channel.connection.disconnect().await;
    serving.await.unwrap().unwrap();
    assert_eq!(adapter.handler_count(), 0);
}

#[tokio::test]
async fn test_connect_named_pipe_without_listener_fails() {
    let adapter = StreamingAdapter::default();
    let result = adapter
        .connect_named_pipe("botstream-missing-pipe", RecordingBot::new(), None)
        .await;
    assert!(result.unwrap_err().is_transport_error());
}
