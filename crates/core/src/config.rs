//! Poller configuration.

use std::time::Duration;

use serde::Deserialize;

/// Cadence and patience knobs for the feed poller. All fields are seconds;
/// anything omitted from a config document keeps its default.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// How often to ask the upstream provider for a fresh batch.
    pub poll_interval_secs: u64,
    /// How long a single fetch may take before it is abandoned.
    pub fetch_timeout_secs: u64,
    /// Feed age beyond which query results are flagged stale.
    pub staleness_threshold_secs: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
            fetch_timeout_secs: 10,
            staleness_threshold_secs: 120,
        }
    }
}

impl PollerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn staleness_threshold(&self) -> Duration {
        Duration::from_secs(self.staleness_threshold_secs)
    }
}
