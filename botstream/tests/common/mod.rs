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

//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use botstream::error::BotError;
use botstream::handler::Bot;
use botstream::protocol::{ContentStream, StreamingRequest, StreamingResponse};
use botstream::schema::{Activity, InvokeResponse};
use botstream::session::{ConnectionConfig, RequestHandler, StreamingConnection};
use botstream::transport::Transport;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Bot that records every activity and returns a fixed result.
#[derive(Default)]
pub struct RecordingBot {
    pub turns: Mutex<Vec<Activity>>,
    pub result: Option<InvokeResponse>,
}

impl RecordingBot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn turn_count(&self) -> usize {
        self.turns.lock().len()
    }
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

/// Bot that panics if it is ever invoked.
pub struct PanickingBot;

#[async_trait]
impl Bot for PanickingBot {
    async fn on_turn(
        &self,
        _activity: Activity,
        _cancel: CancellationToken,
    ) -> Result<Option<InvokeResponse>, BotError> {
        panic!("bot must not be invoked");
    }
}

/// Channel-side request handler answering every request with
/// `{ "id": <name> }`.
struct ChannelHandler {
    name: String,
    received: Arc<Mutex<Vec<StreamingRequest>>>,
}

#[async_trait]
impl RequestHandler for ChannelHandler {
    async fn process_request(
        &self,
        request: StreamingRequest,
        _cancel: CancellationToken,
    ) -> StreamingResponse {
        self.received.lock().push(request);
        StreamingResponse::ok()
            .with_json(&json!({ "id": self.name }))
            .unwrap()
    }
}

/// The channel end of a streaming connection.
pub struct ChannelPeer {
    pub connection: Arc<StreamingConnection>,
    pub received: Arc<Mutex<Vec<StreamingRequest>>>,
}

impl ChannelPeer {
    /// Wraps `transport` and starts listening on it.
    pub fn spawn<T: Transport>(transport: T, name: &str) -> Self {
        let connection = Arc::new(StreamingConnection::new(
            transport,
            ConnectionConfig::default().with_request_timeout(Duration::from_secs(5)),
        ));
        let received = Arc::new(Mutex::new(Vec::new()));
        let handler = Arc::new(ChannelHandler {
            name: name.to_string(),
            received: Arc::clone(&received),
        });

        let listener = Arc::clone(&connection);
        tokio::spawn(async move { listener.listen(handler, CancellationToken::new()).await });

        Self {
            connection,
            received,
        }
    }

    /// Posts an activity to the bot.
    pub async fn post_activity(&self, activity: &Activity) -> StreamingResponse {
        let mut request = StreamingRequest::create_post("/api/messages");
        request.set_body_json(activity).unwrap();
        self.send(request).await
    }

    /// Posts a raw body to the bot.
    pub async fn post_raw(&self, body: &str) -> StreamingResponse {
        let mut request = StreamingRequest::create_post("/api/messages");
        request.set_body(ContentStream::text(body));
        self.send(request).await
    }

    pub async fn send(&self, request: StreamingRequest) -> StreamingResponse {
        self.connection
            .send_request(&request, CancellationToken::new())
            .await
            .unwrap()
    }

    pub fn received_paths(&self) -> Vec<String> {
        self.received
            .lock()
            .iter()
            .map(|request| request.path.clone())
            .collect()
    }
}

pub fn message(conversation_id: &str, service_url: &str) -> Activity {
    Activity::new("message", conversation_id).with_service_url(service_url)
}

/// Waits until `condition` holds, failing the test after two seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
