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

//! Framed request/response sessions.
//!
//! A [`StreamingConnection`] turns a raw [`Transport`](crate::transport::Transport)
//! into a bidirectional request/response channel. Outbound requests are split
//! into frames, inbound frames are reassembled into requests and responses,
//! and responses are paired with the request that asked for them.
//!
//! Inbound requests are handed to a [`RequestHandler`].

mod assembler;
mod config;
mod connection;
mod pending;
mod traits;
mod writer;

pub use self::config::ConnectionConfig;
pub use self::connection::StreamingConnection;
pub use self::pending::PendingRequests;
pub use self::traits::RequestHandler;
