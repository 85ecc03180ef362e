//! sched-replay: conformance harness that replays recorded event timeframes
//! to a scheduler under test over a Unix domain socket.
//!
//! The harness is the server side of a newline-delimited JSON protocol. It
//! claims a socket path, waits for the scheduler to connect, then for each
//! recorded timeframe performs one strict send-then-receive round trip and
//! records the scheduler's tick. Results are persisted as a JSON array for
//! later comparison against a reference run.

pub mod codec;
pub mod config;
pub mod error;
pub mod listener;
pub mod protocol;
pub mod replay;

pub use config::{DEFAULT_ENDPOINT, DEFAULT_INPUT, HarnessConfig};
pub use error::{CodecError, HarnessError};
pub use listener::EndpointListener;
pub use protocol::{Tick, Timeframe};
pub use replay::{ReplayDriver, RunSummary};
