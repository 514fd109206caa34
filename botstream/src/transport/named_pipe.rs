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

//! Named pipe transport implementation.
//!
//! A bot hosted next to its channel (for example inside the same App Service
//! instance) talks to it over a local named pipe instead of a network socket.
//! On Windows this is a real named pipe under `\\.\pipe\`; on Unix platforms the
//! same role is played by a Unix domain socket in the temp directory.
//!
//! # Examples
//!
//! ```rust,no_run
//! use botstream::transport::{NamedPipeListener, NamedPipeTransport, TransportListener};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let listener = NamedPipeListener::bind("bfv4.pipes")?;
//! let client = NamedPipeTransport::connect("bfv4.pipes").await?;
//! let server = listener.accept().await?;
//! # Ok(())
//! # }
//! ```

use crate::transport::{
    ShutdownFuture, Transport, TransportError, TransportId, TransportListener, TransportMetadata,
};
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};
use tracing::{debug, info};

#[cfg(unix)]
use tokio::net::{UnixListener, UnixStream};

#[cfg(windows)]
use tokio::net::windows::named_pipe::{ClientOptions, NamedPipeClient, NamedPipeServer, ServerOptions};

/// Resolves a pipe name to the platform path it lives at.
///
/// Names that already look like a path are used unchanged.
pub fn pipe_path(name: &str) -> PathBuf {
    #[cfg(windows)]
    {
        if name.starts_with(r"\\") {
            PathBuf::from(name)
        } else {
            PathBuf::from(format!(r"\\.\pipe\{}", name))
        }
    }
    #[cfg(unix)]
    {
        if name.contains('/') {
            PathBuf::from(name)
        } else {
            std::env::temp_dir().join(format!("{}.sock", name))
        }
    }
}

#[cfg(unix)]
type PipeStream = UnixStream;

#[cfg(windows)]
enum PipeStream {
    Client(NamedPipeClient),
    Server(NamedPipeServer),
}

#[cfg(windows)]
impl PipeStream {
    fn io_mut(&mut self) -> Pin<&mut (dyn PipeIo)> {
        match self {
            PipeStream::Client(client) => Pin::new(client),
            PipeStream::Server(server) => Pin::new(server),
        }
    }
}

#[cfg(windows)]
trait PipeIo: AsyncRead + AsyncWrite + Unpin {}

#[cfg(windows)]
impl<T: AsyncRead + AsyncWrite + Unpin> PipeIo for T {}

/// Named pipe transport implementation.
pub struct NamedPipeTransport {
    stream: PipeStream,
    metadata: TransportMetadata,
}

impl NamedPipeTransport {
    fn new(stream: PipeStream, path: &std::path::Path, role: &str) -> Self {
        let id = TransportId::next();
        let metadata = TransportMetadata::new(id, "named-pipe")
            .with_local_addr(path.display().to_string())
            .with_peer_addr(format!("{}:{}", role, path.display()));
        Self { stream, metadata }
    }

    /// Connects to a named pipe opened by a listener.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectionFailed`] if no listener is serving
    /// the pipe.
    pub async fn connect(name: &str) -> Result<Self, TransportError> {
        let path = pipe_path(name);
        let stream = Self::open(&path)
            .await
            .map_err(|source| TransportError::ConnectionFailed {
                address: path.display().to_string(),
                source,
            })?;

        let transport = Self::new(stream, &path, "server");
        info!(transport_id = %transport.metadata.id, pipe = %path.display(), "Named pipe connected");
        Ok(transport)
    }

    #[cfg(unix)]
    async fn open(path: &std::path::Path) -> io::Result<PipeStream> {
        UnixStream::connect(path).await
    }

    #[cfg(windows)]
    async fn open(path: &std::path::Path) -> io::Result<PipeStream> {
        // ERROR_PIPE_BUSY: every server instance is taken, retry shortly
        const PIPE_BUSY: i32 = 231;
        let mut attempts = 0;
        loop {
            match ClientOptions::new().open(path) {
                Ok(client) => return Ok(PipeStream::Client(client)),
                Err(e) if e.raw_os_error() == Some(PIPE_BUSY) && attempts < 50 => {
                    attempts += 1;
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Transport for NamedPipeTransport {
    fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }

    fn shutdown(&mut self) -> ShutdownFuture<'_> {
        Box::pin(async move {
            debug!(transport_id = %self.metadata.id, "Shutting down named pipe");
            AsyncWriteExt::shutdown(self)
                .await
                .map_err(|source| TransportError::Io { source })
        })
    }
}

impl AsyncRead for NamedPipeTransport {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        #[cfg(unix)]
        {
            Pin::new(&mut self.get_mut().stream).poll_read(cx, buf)
        }
        #[cfg(windows)]
        {
            self.get_mut().stream.io_mut().poll_read(cx, buf)
        }
    }
}

impl AsyncWrite for NamedPipeTransport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        #[cfg(unix)]
        {
            Pin::new(&mut self.get_mut().stream).poll_write(cx, buf)
        }
        #[cfg(windows)]
        {
            self.get_mut().stream.io_mut().poll_write(cx, buf)
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        #[cfg(unix)]
        {
            Pin::new(&mut self.get_mut().stream).poll_flush(cx)
        }
        #[cfg(windows)]
        {
            self.get_mut().stream.io_mut().poll_flush(cx)
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        #[cfg(unix)]
        {
            Pin::new(&mut self.get_mut().stream).poll_shutdown(cx)
        }
        #[cfg(windows)]
        {
            self.get_mut().stream.io_mut().poll_shutdown(cx)
        }
    }
}

/// Listener serving a named pipe.
pub struct NamedPipeListener {
    path: PathBuf,
    #[cfg(unix)]
    listener: UnixListener,
    #[cfg(windows)]
    next: tokio::sync::Mutex<NamedPipeServer>,
}

impl NamedPipeListener {
    /// Creates the pipe and starts listening on it.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::BindFailed`] if the pipe cannot be created,
    /// e.g. because another listener already owns it.
    #[allow(clippy::result_large_err)]
    pub fn bind(name: &str) -> Result<Self, TransportError> {
        let path = pipe_path(name);
        let bind_failed = |source| TransportError::BindFailed {
            address: path.display().to_string(),
            source,
        };

        #[cfg(unix)]
        {
            let listener = UnixListener::bind(&path).map_err(bind_failed)?;
            info!(pipe = %path.display(), "Named pipe listening");
            Ok(Self { path, listener })
        }
        #[cfg(windows)]
        {
            let server = ServerOptions::new()
                .first_pipe_instance(true)
                .create(&path)
                .map_err(bind_failed)?;
            info!(pipe = %path.display(), "Named pipe listening");
            Ok(Self {
                path,
                next: tokio::sync::Mutex::new(server),
            })
        }
    }

    /// Returns the platform path of the pipe.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl TransportListener for NamedPipeListener {
    type Transport = NamedPipeTransport;

    async fn accept(&self) -> Result<NamedPipeTransport, TransportError> {
        #[cfg(unix)]
        {
            let (stream, _) = self
                .listener
                .accept()
                .await
                .map_err(|source| TransportError::Io { source })?;
            Ok(NamedPipeTransport::new(stream, &self.path, "client"))
        }
        #[cfg(windows)]
        {
            let mut next = self.next.lock().await;
            next.connect()
                .await
                .map_err(|source| TransportError::Io { source })?;
            let replacement = ServerOptions::new()
                .create(&self.path)
                .map_err(|source| TransportError::Io { source })?;
            let connected = std::mem::replace(&mut *next, replacement);
            Ok(NamedPipeTransport::new(
                PipeStream::Server(connected),
                &self.path,
                "client",
            ))
        }
    }

    fn local_addr(&self) -> Result<String, TransportError> {
        Ok(self.path.display().to_string())
    }
}

#[cfg(unix)]
impl Drop for NamedPipeListener {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
