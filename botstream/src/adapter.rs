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

//! Routing of activities across streaming connections.
//!
//! A bot reachable over streaming connections may hold several of them at
//! once, for example while a channel reconnects. The [`StreamingAdapter`]
//! keeps track of them and answers the question "which connection does this
//! conversation live on?" for proactive sends and Connector API calls.

mod config;
mod service_url;
mod streaming_adapter;

pub use self::config::AdapterConfig;
pub use self::service_url::StreamingServiceUrl;
pub use self::streaming_adapter::StreamingAdapter;
