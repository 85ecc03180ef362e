//! Harness configuration.
//!
//! Everything the driver needs is explicit here — paths, limits — so the
//! library never consults the environment or process-global state.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default endpoint path, relative to wherever the operator runs the harness.
pub const DEFAULT_ENDPOINT: &str = "event.socket";

/// Default input file.
pub const DEFAULT_INPUT: &str = "tests/sample_input.json";

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Unix socket path the harness listens on.
    pub endpoint: PathBuf,

    /// JSON file holding the ordered timeframe array.
    pub input: PathBuf,

    /// Overrides the derived output path when set.
    pub output: Option<PathBuf>,

    /// Bounded wait for the scheduler to connect; `None` blocks forever.
    pub accept_timeout: Option<Duration>,

    /// Bounded wait for each tick; `None` blocks forever.
    pub receive_timeout: Option<Duration>,
}

impl HarnessConfig {
    pub fn new(endpoint: impl Into<PathBuf>, input: impl Into<PathBuf>) -> Self {
        Self {
            endpoint: endpoint.into(),
            input: input.into(),
            output: None,
            accept_timeout: None,
            receive_timeout: None,
        }
    }

    /// Where the run result is written: the explicit override when set,
    /// otherwise the input file name with its `.json` suffix replaced by
    /// `_output.json` (appended when the suffix is absent).
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => derive_output_path(&self.input),
        }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT, DEFAULT_INPUT)
    }
}

fn derive_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("run");
    let output = match name.strip_suffix(".json") {
        Some(stem) => format!("{stem}_output.json"),
        None => format!("{name}_output.json"),
    };
    input.with_file_name(output)
}
