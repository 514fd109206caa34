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

use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::Instant;

/// Conversations a handler has seen, with the time each was first seen.
///
/// A conversation is recorded once and never refreshed; it stays until it is
/// explicitly forgotten, which the router does when the conversation has
/// moved to a newer connection.
#[derive(Debug, Default)]
pub struct ConversationAffinity {
    conversations: Mutex<HashMap<String, Instant>>,
}

impl ConversationAffinity {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a conversation unless already present.
    ///
    /// Returns `true` if it was newly added.
    pub fn insert_if_absent(&self, conversation_id: &str) -> bool {
        match self.conversations.lock().entry(conversation_id.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(Instant::now());
                true
            }
        }
    }

    /// Returns `true` if the conversation is recorded.
    pub fn contains(&self, conversation_id: &str) -> bool {
        self.conversations.lock().contains_key(conversation_id)
    }

    /// Returns when the conversation was first seen.
    pub fn added_time(&self, conversation_id: &str) -> Option<Instant> {
        self.conversations.lock().get(conversation_id).copied()
    }

    /// Removes a conversation. Returns `true` if it was present.
    pub fn forget(&self, conversation_id: &str) -> bool {
        self.conversations.lock().remove(conversation_id).is_some()
    }

    /// Returns the recorded conversation ids.
    pub fn ids(&self) -> Vec<String> {
        self.conversations.lock().keys().cloned().collect()
    }

    /// Returns the number of recorded conversations.
    pub fn len(&self) -> usize {
        self.conversations.lock().len()
    }

    /// Returns `true` if no conversation is recorded.
    pub fn is_empty(&self) -> bool {
        self.conversations.lock().is_empty()
    }
}
