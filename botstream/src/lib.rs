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

#![doc = include_str!("../../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! ## Architecture
//!
//! The crate is organized in layers, each usable on its own:
//!
//! - **[`transport`]**: duplex byte streams (WebSocket, named pipe, memory)
//! - **[`protocol`]**: the 48-byte frame header and request/response envelopes
//! - **[`session`]**: framed request/response sessions over a transport
//! - **[`schema`]**: the activity JSON carried in request bodies
//! - **[`handler`]**: one bot bound to one connection
//! - **[`adapter`]**: routing of conversations across connections
//! - **[`observability`]**: counters for connections, requests and sends
//!
//! ## Errors
//!
//! Every fallible operation returns [`StreamingError`] or one of the layer
//! errors it wraps. Outbound sends separate hard failures (`Err`) from soft,
//! already-logged failures (`Ok(None)`).

pub mod adapter;
pub mod error;
pub mod handler;
pub mod observability;
pub mod protocol;
pub mod schema;
pub mod session;
pub mod transport;

pub use adapter::{AdapterConfig, StreamingAdapter, StreamingServiceUrl};
pub use error::{BotError, StreamingError};
pub use handler::{Bot, DirectProcessor, StreamingActivityProcessor, StreamingRequestHandler};
pub use observability::StreamingMetrics;
pub use protocol::{ContentStream, StreamingRequest, StreamingResponse};
pub use schema::{Activity, Attachment, InvokeResponse, ResourceResponse};
pub use session::{ConnectionConfig, RequestHandler, StreamingConnection};
pub use transport::{Transport, TransportError};
