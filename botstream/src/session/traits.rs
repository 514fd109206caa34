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

use crate::protocol::{StreamingRequest, StreamingResponse};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Answers requests arriving on a [`StreamingConnection`](crate::session::StreamingConnection).
///
/// The connection dispatches every complete request to its handler on a
/// separate task, so a slow request never stalls the read loop. The token is
/// cancelled when the connection closes.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use botstream::protocol::{StreamingRequest, StreamingResponse};
/// use botstream::session::RequestHandler;
/// use tokio_util::sync::CancellationToken;
///
/// struct Echo;
///
/// #[async_trait]
/// impl RequestHandler for Echo {
///     async fn process_request(
///         &self,
///         request: StreamingRequest,
///         _cancel: CancellationToken,
///     ) -> StreamingResponse {
///         let mut response = StreamingResponse::ok();
///         if let Some(body) = request.body() {
///             response.set_body(body.clone());
///         }
///         response
///     }
/// }
/// ```
#[async_trait]
pub trait RequestHandler: Send + Sync + 'static {
    /// Produces the response for one inbound request.
    async fn process_request(
        &self,
        request: StreamingRequest,
        cancel: CancellationToken,
    ) -> StreamingResponse;
}
