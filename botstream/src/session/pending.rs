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

//! Tracking of outbound requests awaiting their responses.

use std::collections::HashMap;
use tokio::sync::{Mutex, oneshot};
use uuid::Uuid;

/// Tracks outbound requests awaiting responses.
///
/// Responses are matched to requests by the request id carried in the frame
/// header, never by arrival order, so any number of requests may be in flight
/// on one connection.
///
/// # Example
///
/// ```rust
/// use botstream::session::PendingRequests;
/// use uuid::Uuid;
///
/// # async fn example() {
/// let pending = PendingRequests::<u16>::new();
/// let id = Uuid::new_v4();
///
/// let rx = pending.register(id).await;
/// pending.complete(id, 200).await;
/// assert_eq!(rx.await.unwrap(), 200);
/// # }
/// ```
#[derive(Debug)]
pub struct PendingRequests<T> {
    requests: Mutex<HashMap<Uuid, oneshot::Sender<T>>>,
}

impl<T> PendingRequests<T> {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a request and returns the receiver its response arrives on.
    pub async fn register(&self, request_id: Uuid) -> oneshot::Receiver<T> {
        let (tx, rx) = oneshot::channel();
        self.requests.lock().await.insert(request_id, tx);
        rx
    }

    /// Completes a pending request.
    ///
    /// Returns `false` if no request with this id is pending or its caller
    /// stopped waiting.
    pub async fn complete(&self, request_id: Uuid, response: T) -> bool {
        match self.requests.lock().await.remove(&request_id) {
            Some(tx) => tx.send(response).is_ok(),
            None => false,
        }
    }

    /// Drops a pending request (e.g., on timeout). Its receiver observes an
    /// error.
    pub async fn cancel(&self, request_id: Uuid) -> bool {
        self.requests.lock().await.remove(&request_id).is_some()
    }

    /// Removes every pending request, returning their senders.
    pub async fn drain(&self) -> Vec<oneshot::Sender<T>> {
        self.requests
            .lock()
            .await
            .drain()
            .map(|(_, tx)| tx)
            .collect()
    }

    /// Get the number of pending requests.
    pub async fn len(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Returns `true` if there are no pending requests.
    pub async fn is_empty(&self) -> bool {
        self.requests.lock().await.is_empty()
    }
}

impl<T> Default for PendingRequests<T> {
    fn default() -> Self {
        Self::new()
    }
}
