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

//! Observability for streaming connections.
//!
//! Logging goes through `tracing` throughout the crate: lifecycle events at
//! `info`, per-frame detail at `debug`, soft failures at `warn` and failed
//! requests at `error`, all with structured fields such as `transport_id` and
//! `conversation_id`.
//!
//! Counters live in [`StreamingMetrics`]. One instance is shared by an adapter
//! and every handler and connection it creates; enable the `observability`
//! feature to export them through the `metrics` crate.
//!
//! # Examples
//!
//! ```rust
//! use botstream::observability::StreamingMetrics;
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(StreamingMetrics::new());
//! metrics.record_activity_sent();
//! assert_eq!(metrics.activities_sent(), 1);
//! ```

mod metrics;

pub use self::metrics::StreamingMetrics;
