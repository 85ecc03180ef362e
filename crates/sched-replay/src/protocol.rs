//! Wire protocol types for harness-scheduler communication.
//!
//! One JSON value per line in each direction: the harness sends a
//! [`Timeframe`], the scheduler answers with exactly one [`Tick`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One unit of input: a virtual-time marker plus a batch of opaque events.
///
/// Events are forwarded verbatim; the harness attaches no meaning to them
/// and never reorders or validates `vtime`. Whatever order the input file
/// gives is the wire order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeframe {
    pub vtime: i64,
    pub events: Vec<Value>,
}

/// One scheduler decision, correlated to the timeframe that elicited it.
///
/// `meta` is kept as an opaque JSON object so the persisted output is a
/// verbatim record of what the scheduler sent; well-known counters are
/// exposed through typed accessors that default to zero when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub vtime: i64,
    pub schedule: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Map<String, Value>>,
}

impl Tick {
    /// Look up a meta counter, defaulting to zero when absent.
    pub fn counter(&self, name: &str) -> u64 {
        self.meta
            .as_ref()
            .and_then(|meta| meta.get(name))
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    pub fn preemptions(&self) -> u64 {
        self.counter("preemptions")
    }

    pub fn migrations(&self) -> u64 {
        self.counter("migrations")
    }
}
