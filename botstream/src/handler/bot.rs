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

use crate::error::BotError;
use crate::schema::{Activity, InvokeResponse};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Application logic run once per inbound activity.
///
/// Returning an [`InvokeResponse`] sets the status and body of the reply to
/// the channel; returning `None` answers with 200 and no body.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use botstream::error::BotError;
/// use botstream::handler::Bot;
/// use botstream::schema::{Activity, InvokeResponse};
/// use tokio_util::sync::CancellationToken;
///
/// struct EchoBot;
///
/// #[async_trait]
/// impl Bot for EchoBot {
///     async fn on_turn(
///         &self,
///         activity: Activity,
///         _cancel: CancellationToken,
///     ) -> Result<Option<InvokeResponse>, BotError> {
///         println!("received {}", activity.activity_type);
///         Ok(None)
///     }
/// }
/// ```
#[async_trait]
pub trait Bot: Send + Sync + 'static {
    /// Handles one activity.
    async fn on_turn(
        &self,
        activity: Activity,
        cancel: CancellationToken,
    ) -> Result<Option<InvokeResponse>, BotError>;
}

/// Runs a bot for an activity received over a streaming connection.
///
/// Request handlers never call a bot directly; they go through a processor
/// so hosts can wrap every turn.
#[async_trait]
pub trait StreamingActivityProcessor: Send + Sync + 'static {
    /// Processes one activity with `bot`.
    async fn process_streaming_activity(
        &self,
        activity: Activity,
        bot: &dyn Bot,
        cancel: CancellationToken,
    ) -> Result<Option<InvokeResponse>, BotError>;
}

/// Processor that hands the activity straight to the bot.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectProcessor;

#[async_trait]
impl StreamingActivityProcessor for DirectProcessor {
    async fn process_streaming_activity(
        &self,
        activity: Activity,
        bot: &dyn Bot,
        cancel: CancellationToken,
    ) -> Result<Option<InvokeResponse>, BotError> {
        bot.on_turn(activity, cancel).await
    }
}
