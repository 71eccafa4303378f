//! Configuration for the client session manager.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for real-time delivery and its polling fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Whether to attempt the push transport at all.
    pub enable_push: bool,
    /// Maximum number of reconnect attempts before degrading to polling.
    pub reconnect_attempts: u32,
    /// Delay between reconnect attempts (milliseconds).
    pub reconnect_delay_ms: u64,
    /// Polling period while in fallback mode (milliseconds).
    pub poll_interval_ms: u64,
    /// Endpoint for the stateless refresh request used while polling.
    pub refresh_url: String,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            enable_push: true,
            reconnect_attempts: 5,
            reconnect_delay_ms: 3_000,
            poll_interval_ms: 30_000,
            refresh_url: "/api/reports/refresh".to_string(),
        }
    }
}

impl RealtimeConfig {
    /// Delay between reconnect attempts.
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Polling period while in fallback mode.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
