//! Harness configuration
//!
//! All knobs have defaults; a YAML file can override any subset.

use crate::commands::text::CasingPolicy;
use crate::device::poller::PollConfig;
use crate::error::{Error, Result};
use crate::session::parse_version;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Appium server listen port
    pub appium_port: u16,

    /// Settle time before the first shutdown-state check (ms)
    pub poll_initial_wait_ms: u64,

    /// Cadence between shutdown-state checks (ms)
    pub poll_interval_ms: u64,

    /// Shutdown-poll attempt budget
    pub poll_max_attempts: u32,

    /// Allowed mismatch percent for screenshot tests
    pub screenshot_threshold: f64,

    /// Allowed mismatch percent for direct screen comparison
    pub compare_threshold: f64,

    /// Platform version at which label matching switches to upper case
    pub casing_uppercase_from: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            appium_port: crate::session::server::DEFAULT_PORT,
            poll_initial_wait_ms: 2000,
            poll_interval_ms: 1000,
            poll_max_attempts: 20,
            screenshot_threshold: crate::commands::DEFAULT_SCREENSHOT_THRESHOLD,
            compare_threshold: crate::commands::DEFAULT_COMPARE_THRESHOLD,
            casing_uppercase_from: "7.0".to_string(),
        }
    }
}

impl HarnessConfig {
    /// Load from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&raw)
            .map_err(|e| Error::InvalidArgument(format!("bad config {}: {}", path.display(), e)))
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            initial_wait: Duration::from_millis(self.poll_initial_wait_ms),
            interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.poll_max_attempts,
        }
    }

    pub fn casing_policy(&self) -> CasingPolicy {
        CasingPolicy {
            uppercase_from: parse_version(&self.casing_uppercase_from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.appium_port, 4723);
        assert_eq!(config.poll_max_attempts, 20);
        assert_eq!(
            config.poll_config().max_total(),
            Duration::from_millis(22000)
        );
        assert_eq!(config.casing_policy().uppercase_from, (7, 0));
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let config: HarnessConfig =
            serde_yaml::from_str("poll_max_attempts: 5\ncasing_uppercase_from: \"8.1\"\n").unwrap();
        assert_eq!(config.poll_max_attempts, 5);
        assert_eq!(config.casing_policy().uppercase_from, (8, 1));
        // untouched knobs keep their defaults
        assert_eq!(config.appium_port, 4723);
    }
}
