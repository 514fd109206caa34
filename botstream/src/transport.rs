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

//! Transport layer abstractions.
//!
//! A streaming connection runs over any reliable duplex byte stream. The
//! [`Transport`] trait captures that contract, and this module ships three
//! implementations of it:
//!
//! - [`WebSocketTransport`]: the usual link between a channel host and a bot
//!   (requires the `websocket` feature)
//! - [`NamedPipeTransport`]: local IPC for bots hosted next to their channel
//!   (requires the `named-pipe` feature)
//! - [`MemoryTransport`]: in-process pairs for tests
//!
//! # Examples
//!
//! ```rust
//! use botstream::transport::MemoryTransport;
//! use tokio::io::{AsyncReadExt, AsyncWriteExt};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (mut client, mut server) = MemoryTransport::pair(1024);
//!
//! client.write_all(b"Hello").await?;
//!
//! let mut buffer = vec![0u8; 5];
//! server.read_exact(&mut buffer).await?;
//! assert_eq!(&buffer, b"Hello");
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All transport operations return [`TransportError`]:
//!
//! ```rust
//! use botstream::transport::{NamedPipeTransport, TransportError};
//!
//! # async fn example() {
//! match NamedPipeTransport::connect("no-such-pipe").await {
//!     Ok(_) => println!("Connected"),
//!     Err(TransportError::ConnectionFailed { address, source }) => {
//!         eprintln!("Failed to connect to {}: {}", address, source);
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # }
//! ```

mod connector;
mod error;
mod memory;
#[cfg(all(feature = "named-pipe", any(unix, windows)))]
mod named_pipe;
mod traits;
mod types;
#[cfg(feature = "websocket")]
mod websocket;

pub use self::connector::TransportConnector;
#[cfg(feature = "websocket")]
pub use self::connector::WebSocketConnector;
pub use self::error::TransportError;
pub use self::memory::MemoryTransport;
#[cfg(all(feature = "named-pipe", any(unix, windows)))]
pub use self::named_pipe::{NamedPipeListener, NamedPipeTransport, pipe_path};
pub use self::traits::{ShutdownFuture, Transport, TransportListener};
pub use self::types::{TransportId, TransportMetadata};
#[cfg(feature = "websocket")]
pub use self::websocket::{WebSocketConfig, WebSocketListener, WebSocketTransport};
