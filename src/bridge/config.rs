//! Configuration for the channel service bridge.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8103;

/// What a query returns when the service answers with the zero sentinel
/// ("no measurement available").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SentinelPolicy {
    /// Return the zero as the delay.
    #[default]
    PassThrough,
    /// Return the local constant-speed baseline instead.
    FallbackToBaseline,
}

/// Settings fixed once before the simulation starts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BridgeConfig {
    /// Route delay queries through the channel service.
    pub enabled: bool,
    /// Host of the channel service.
    pub server_address: String,
    pub port: u16,
    /// The service runs on this machine; skip proxy resolution.
    pub local_machine: bool,
    /// Record baseline/external pairs in the progress log.
    pub verbose: bool,
    /// Per-request timeout. Absent means block until the service answers.
    pub timeout_secs: Option<u64>,
    pub sentinel_policy: SentinelPolicy,
    /// File receiving comparison records, in addition to the in-memory buffer.
    pub progress_log: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            local_machine: true,
            verbose: false,
            timeout_secs: None,
            sentinel_policy: SentinelPolicy::default(),
            progress_log: None,
        }
    }
}

impl BridgeConfig {
    /// Base URL of the channel service (without the /command suffix).
    pub fn service_url(&self) -> String {
        format!("http://{}:{}", self.server_address, self.port)
    }

    /// Per-request timeout for the HTTP client.
    ///
    /// # Returns
    /// * `Some(duration)` when `timeout-secs` is set
    /// * `None` to block until the service answers
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
