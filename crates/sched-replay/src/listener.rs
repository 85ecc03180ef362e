//! Single-shot Unix socket listener with artifact cleanup.
//!
//! The harness is the server side of the protocol: it claims a filesystem
//! socket path, waits for exactly one scheduler connection, and removes the
//! socket file when the run is over no matter how the run ended. Only the
//! first connection is used; this is a test-harness simplification, not
//! general-purpose server behavior.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::net::{UnixListener, UnixStream};

use crate::error::HarnessError;

pub struct EndpointListener {
    listener: Option<UnixListener>,
    path: PathBuf,
}

impl EndpointListener {
    /// Claim `path`, unlinking any stale socket file first.
    ///
    /// The unlink is best-effort and not atomic against another process
    /// racing for the same path; the harness is single-tenant by design.
    pub fn bind(path: impl Into<PathBuf>) -> Result<Self, HarnessError> {
        let path = path.into();

        if path.exists() {
            std::fs::remove_file(&path).map_err(|source| HarnessError::Bind {
                path: path.clone(),
                source,
            })?;
        }

        let listener = match UnixListener::bind(&path) {
            Ok(listener) => listener,
            Err(source) => {
                // A failed bind can still leave a dead socket file behind.
                let _ = std::fs::remove_file(&path);
                return Err(HarnessError::Bind { path, source });
            }
        };

        tracing::debug!(path = %path.display(), "bound endpoint");
        Ok(Self {
            listener: Some(listener),
            path,
        })
    }

    /// Wait for the single scheduler connection, bounded by `timeout` when
    /// one is configured.
    pub async fn accept(&self, timeout: Option<Duration>) -> Result<UnixStream, HarnessError> {
        let listener = self.listener.as_ref().ok_or_else(|| {
            HarnessError::Transport(io::Error::new(
                io::ErrorKind::NotConnected,
                "endpoint already closed",
            ))
        })?;

        let accepted = match timeout {
            Some(limit) => tokio::time::timeout(limit, listener.accept())
                .await
                .map_err(|_| {
                    HarnessError::Transport(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "no peer connected within the accept timeout",
                    ))
                })?,
            None => listener.accept().await,
        };

        let (stream, _) = accepted.map_err(HarnessError::Transport)?;
        tracing::info!(path = %self.path.display(), "scheduler connected");
        Ok(stream)
    }

    /// Release the socket and remove its filesystem artifact. Idempotent;
    /// a missing artifact is not a failure.
    pub fn close(&mut self) {
        if self.listener.take().is_none() {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed endpoint artifact"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "failed to remove endpoint artifact");
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for EndpointListener {
    fn drop(&mut self) {
        self.close();
    }
}
