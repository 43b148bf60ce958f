use std::time::Duration;

use serde::Serialize;

/// Normalised outcome of one ping invocation.
///
/// None of the non-success variants is an error in the Rust sense: they are counted as
/// sent-but-not-received and the run just carries on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeResult {
    Success {
        ip: String,
        bytes_returned: u32,
        round_trip_ms: u32,
        ttl: u32,
        /// Only reported by the `icmp_seq` flavour of reply lines
        sequence: Option<u32>,
    },
    Timeout,
    Unreachable,
    /// The ping binary could not be launched at all
    SpawnError { message: String },
    /// Nothing we recognise, raw stdout kept for diagnostics
    Unknown { raw_output: String },
}

impl ProbeResult {
    pub fn round_trip_ms(&self) -> Option<u32> {
        match self {
            ProbeResult::Success { round_trip_ms, .. } => Some(*round_trip_ms),
            _ => None,
        }
    }
}

/// Settings for one invocation, immutable once the run has started.
///
/// Values are validated when the CLI is parsed (see `cmd_logic::Params`); nothing
/// downstream checks them again:
///  - `target` is non-empty,
///  - `count` is absent (run until stopped) or at least 1,
///  - `interval_ms` is at least 100,
///  - `timeout_secs` is at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunConfig {
    pub target: String,
    pub count: Option<u64>,
    pub interval_ms: u64,
    pub timeout_secs: u64,
}

impl RunConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn is_continuous(&self) -> bool {
        self.count.is_none()
    }
}
