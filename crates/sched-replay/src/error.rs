//! Error taxonomy for the replay harness.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the framing codec.
///
/// Splitting transport failures from decode failures lets the driver map
/// them to distinct run outcomes: an I/O error means the channel died, a
/// JSON error means the peer violated the protocol.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<tokio_util::codec::LinesCodecError> for CodecError {
    fn from(err: tokio_util::codec::LinesCodecError) -> Self {
        match err {
            tokio_util::codec::LinesCodecError::Io(e) => Self::Io(e),
            tokio_util::codec::LinesCodecError::MaxLineLengthExceeded => Self::Io(
                io::Error::new(io::ErrorKind::InvalidData, "max line length exceeded"),
            ),
        }
    }
}

/// Top-level failure modes of a replay run.
///
/// A graceful peer disconnect is *not* represented here: end of stream ends
/// the run as a partial success and never surfaces as an error.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Input file absent or not a valid timeframe array. Raised before any
    /// resources are acquired.
    #[error("input file {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    /// The endpoint path could not be claimed.
    #[error("failed to bind endpoint {}: {source}", .path.display())]
    Bind {
        path: PathBuf,
        source: io::Error,
    },

    /// Write failure, connection loss during a send, or a configured wait
    /// expiring. Terminates the run; partial results are still persisted.
    #[error("transport failure: {0}")]
    Transport(#[source] io::Error),

    /// The scheduler sent a line that does not decode as a tick.
    /// Terminates the run; partial results are still persisted.
    #[error("protocol violation: {0}")]
    Protocol(#[source] serde_json::Error),

    /// Persisting the run result failed.
    #[error("failed to write results to {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        source: io::Error,
    },
}

impl From<CodecError> for HarnessError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => Self::Transport(e),
            CodecError::Json(e) => Self::Protocol(e),
        }
    }
}
