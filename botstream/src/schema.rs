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

//! Activity schema carried in request bodies.
//!
//! Only the members the streaming layer reads or writes are typed. Everything
//! else a channel sends is kept in an `extra` map and written back unchanged,
//! so activities pass through without losing data.

mod activity;
mod attachment;
mod responses;

pub use self::activity::{Activity, ConversationAccount, activity_types};
pub use self::attachment::{Attachment, AttachmentContent};
pub use self::responses::{InvokeResponse, ResourceResponse, VersionInfo};
