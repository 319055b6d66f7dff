//! Configuration for the discovery facade.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the discovery facade and its browse sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Domain browsed when the caller does not supply one
    #[serde(default = "default_browse_domain")]
    pub browse_domain: String,

    /// How long a browse may sit in the waiting state before a timeout
    /// notice is surfaced (seconds). `None` disables the timer.
    #[serde(default = "default_waiting_timeout")]
    pub waiting_timeout_secs: Option<u64>,

    /// How long the permission trigger waits for a listener verdict before
    /// treating the prompt as denied (seconds)
    #[serde(default = "default_permission_timeout")]
    pub permission_timeout_secs: u64,

    /// Run the permission trigger before every browse
    #[serde(default)]
    pub trigger_permission_prompt: bool,

    /// Capacity of the event channel between a session and its consumer
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            browse_domain: default_browse_domain(),
            waiting_timeout_secs: default_waiting_timeout(),
            permission_timeout_secs: default_permission_timeout(),
            trigger_permission_prompt: false,
            event_buffer: default_event_buffer(),
        }
    }
}

impl DiscoveryConfig {
    /// Returns the waiting timeout as a Duration; `None` disables the timer.
    pub fn waiting_timeout(&self) -> Option<Duration> {
        self.waiting_timeout_secs.map(Duration::from_secs)
    }

    /// Returns the permission trigger timeout as a Duration.
    pub fn permission_timeout(&self) -> Duration {
        Duration::from_secs(self.permission_timeout_secs)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.browse_domain.is_empty() {
            return Err("browse_domain cannot be empty".to_string());
        }

        if self.waiting_timeout_secs == Some(0) {
            return Err(
                "waiting_timeout_secs cannot be 0; omit it to disable the timer".to_string(),
            );
        }

        if self.permission_timeout_secs == 0 {
            return Err("permission_timeout_secs cannot be 0".to_string());
        }

        if self.event_buffer == 0 {
            return Err("event_buffer cannot be 0".to_string());
        }

        Ok(())
    }
}

// Default configuration values
fn default_browse_domain() -> String {
    "local.".to_string()
}

fn default_waiting_timeout() -> Option<u64> {
    Some(5)
}

fn default_permission_timeout() -> u64 {
    5
}

fn default_event_buffer() -> usize {
    1000
}
