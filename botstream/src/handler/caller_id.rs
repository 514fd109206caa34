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

//! Derivation of `callerId` from a connection's audience.

use uuid::Uuid;

/// Caller id of the public Azure channel service.
pub const PUBLIC_AZURE_CHANNEL: &str = "public-azure-channel";

/// Caller id of the US Government channel service.
pub const US_GOV_CHANNEL: &str = "us-gov-channel";

/// Prefix of caller ids identifying another bot.
pub const BOT_TO_BOT_PREFIX: &str = "bot-to-bot:";

/// OAuth scope of bot-to-channel calls in the public cloud.
pub const PUBLIC_CHANNEL_AUDIENCE: &str = "https://api.botframework.com";

/// OAuth scope of bot-to-channel calls in the US Government cloud.
pub const US_GOV_CHANNEL_AUDIENCE: &str = "https://api.botframework.us";

/// Maps a handler's audience to the `callerId` stamped on inbound activities.
///
/// # Examples
///
/// ```rust
/// use botstream::handler::caller_id_from_audience;
///
/// assert_eq!(
///     caller_id_from_audience(Some("https://api.botframework.com")).as_deref(),
///     Some("public-azure-channel")
/// );
/// assert_eq!(
///     caller_id_from_audience(Some("9a8b7c6d-0000-4000-8000-123456789abc")).as_deref(),
///     Some("bot-to-bot:9a8b7c6d-0000-4000-8000-123456789abc")
/// );
/// assert_eq!(caller_id_from_audience(Some("")), None);
/// ```
pub fn caller_id_from_audience(audience: Option<&str>) -> Option<String> {
    let audience = audience.filter(|audience| !audience.is_empty())?;
    let caller_id = match audience {
        PUBLIC_CHANNEL_AUDIENCE => PUBLIC_AZURE_CHANNEL.to_string(),
        US_GOV_CHANNEL_AUDIENCE => US_GOV_CHANNEL.to_string(),
        other if Uuid::parse_str(other).is_ok() => format!("{}{}", BOT_TO_BOT_PREFIX, other),
        other => other.to_string(),
    };
    Some(caller_id)
}

/// Maps a `callerId` back to the audience that produces it.
///
/// Only the two channel ids and bot-to-bot ids are recognised; the prefix
/// match is case-insensitive.
pub fn audience_from_caller_id(caller_id: Option<&str>) -> Option<String> {
    let caller_id = caller_id?;
    match caller_id {
        PUBLIC_AZURE_CHANNEL => Some(PUBLIC_CHANNEL_AUDIENCE.to_string()),
        US_GOV_CHANNEL => Some(US_GOV_CHANNEL_AUDIENCE.to_string()),
        _ => {
            let prefix_len = BOT_TO_BOT_PREFIX.len();
            let prefix = caller_id.get(..prefix_len)?;
            if prefix.eq_ignore_ascii_case(BOT_TO_BOT_PREFIX) {
                Some(caller_id[prefix_len..].to_string())
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_audiences() {
        assert_eq!(
            caller_id_from_audience(Some(PUBLIC_CHANNEL_AUDIENCE)).as_deref(),
            Some(PUBLIC_AZURE_CHANNEL)
        );
        assert_eq!(
            caller_id_from_audience(Some(US_GOV_CHANNEL_AUDIENCE)).as_deref(),
            Some(US_GOV_CHANNEL)
        );
    }

    #[test]
    fn test_guid_audience_is_bot_to_bot() {
        let app_id = "f2a6b8c4-1d3e-4f5a-9b7c-0e1d2f3a4b5c";
        assert_eq!(
            caller_id_from_audience(Some(app_id)),
            Some(format!("bot-to-bot:{}", app_id))
        );
    }

    #[test]
    fn test_other_audience_is_verbatim() {
        assert_eq!(
            caller_id_from_audience(Some("api://custom")).as_deref(),
            Some("api://custom")
        );
        // Matching is exact, so a differently cased scope is passed through
        assert_eq!(
            caller_id_from_audience(Some("HTTPS://API.BOTFRAMEWORK.COM")).as_deref(),
            Some("HTTPS://API.BOTFRAMEWORK.COM")
        );
    }

    #[test]
    fn test_missing_audience() {
        assert_eq!(caller_id_from_audience(None), None);
        assert_eq!(caller_id_from_audience(Some("")), None);
    }

    #[test]
    fn test_audience_from_caller_id() {
        assert_eq!(
            audience_from_caller_id(Some(PUBLIC_AZURE_CHANNEL)).as_deref(),
            Some(PUBLIC_CHANNEL_AUDIENCE)
        );
        assert_eq!(
            audience_from_caller_id(Some("Bot-To-Bot:app")).as_deref(),
            Some("app")
        );
        assert_eq!(audience_from_caller_id(Some("urn:other")), None);
        assert_eq!(audience_from_caller_id(Some("bot")), None);
        assert_eq!(audience_from_caller_id(None), None);
    }
}
