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

//! Request handling for one streaming connection.
//!
//! A [`StreamingRequestHandler`] sits between a
//! [`StreamingConnection`](crate::session::StreamingConnection) and a [`Bot`].
//! Inbound it answers the control path, turns request bodies into activities,
//! records conversation affinity and runs the bot. Outbound it turns activities
//! back into requests.
//!
//! # Inbound status codes
//!
//! | Situation | Status |
//! |---|---|
//! | `GET /api/version` | 200 with `{ "userAgent": … }` |
//! | other non-POST request | 400 |
//! | body missing, not UTF-8 or not an activity | 400 |
//! | activity without a conversation id | 400 |
//! | bot returned nothing | 200 |
//! | bot returned an [`InvokeResponse`](crate::schema::InvokeResponse) | its status and body |
//! | bot failed, panicked or was cancelled | 500 |

mod affinity;
mod bot;
mod caller_id;
mod request_handler;
mod version;

pub use self::affinity::ConversationAffinity;
pub use self::bot::{Bot, DirectProcessor, StreamingActivityProcessor};
pub use self::caller_id::{
    BOT_TO_BOT_PREFIX, PUBLIC_AZURE_CHANNEL, PUBLIC_CHANNEL_AUDIENCE, US_GOV_CHANNEL,
    US_GOV_CHANNEL_AUDIENCE, audience_from_caller_id, caller_id_from_audience,
};
pub use self::request_handler::StreamingRequestHandler;
pub use self::version::user_agent;
