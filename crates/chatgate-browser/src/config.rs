//! Browser channel configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning for the browser channel. Defaults match the driven site's
/// observed rendering behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Chat page URL.
    #[serde(default = "default_chat_url")]
    pub chat_url: String,
    /// Chrome/Chromium binary. Resolved from PATH when unset.
    #[serde(default)]
    pub chrome_binary: Option<String>,
    /// Run headless for steady-state generation calls.
    #[serde(default = "default_true")]
    pub headless: bool,
    /// Reply-region poll interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Consecutive unchanged samples required to declare the reply done.
    #[serde(default = "default_stable_samples")]
    pub stable_samples: u32,
    /// Wall-clock cap on waiting for a stable reply, in seconds.
    #[serde(default = "default_stall_timeout_secs")]
    pub stall_timeout_secs: u64,
    /// Page load / navigation timeout in seconds.
    #[serde(default = "default_nav_timeout_secs")]
    pub nav_timeout_secs: u64,
    /// Character cap on the prior-turns context section of the composed
    /// prompt.
    #[serde(default = "default_context_cap")]
    pub context_cap_chars: usize,
}

fn default_chat_url() -> String {
    "https://chatgpt.com".into()
}
fn default_true() -> bool {
    true
}
fn default_poll_interval_ms() -> u64 {
    300
}
fn default_stable_samples() -> u32 {
    3
}
fn default_stall_timeout_secs() -> u64 {
    60
}
fn default_nav_timeout_secs() -> u64 {
    60
}
fn default_context_cap() -> usize {
    1500
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chat_url: default_chat_url(),
            chrome_binary: None,
            headless: true,
            poll_interval_ms: default_poll_interval_ms(),
            stable_samples: default_stable_samples(),
            stall_timeout_secs: default_stall_timeout_secs(),
            nav_timeout_secs: default_nav_timeout_secs(),
            context_cap_chars: default_context_cap(),
        }
    }
}

impl BrowserConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn stall_timeout(&self) -> Duration {
        Duration::from_secs(self.stall_timeout_secs)
    }

    pub fn nav_timeout(&self) -> Duration {
        Duration::from_secs(self.nav_timeout_secs)
    }
}
