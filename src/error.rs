//! Harness error taxonomy
//!
//! Every failure surfaces to the caller as one of these variants so tests can
//! tell a configuration mistake from a device that never stabilized or a
//! visual regression. The one exception is the poller's trailing best-effort
//! UI cleanup, which is fire-and-forget by contract.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed caller input, rejected before any external call.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested simulator does not exist in the simctl registry.
    #[error(
        "no iOS {version} simulator named '{name}' was found. \
         The simulator may not be configured on this machine - \
         check `xcrun simctl list devices`"
    )]
    SimulatorNotConfigured { name: String, version: String },

    /// No live emulator process matched the requested AVD.
    #[error("no running emulator process matched '{0}'. Is the emulator started?")]
    EmulatorNotRunning(String),

    /// An element lookup matched nothing on the current screen.
    #[error("no element matched {0}")]
    ElementNotFound(String),

    /// A log-content assertion did not hold.
    #[error("log assertion failed for '{term}': expected {expected}, found {found} matching entries")]
    LogAssertion {
        term: String,
        expected: String,
        found: usize,
    },

    /// Poll budget exhausted without observing the target state.
    ///
    /// Warning-class: the shutdown was issued and may have partially
    /// succeeded, the device just never reported it within the window.
    #[error(
        "device '{device}' still reported '{last_state}' after {attempts} checks; \
         shutdown may not have completed"
    )]
    ShutdownUnconfirmed {
        device: String,
        last_state: String,
        attempts: u32,
    },

    /// Candidate and reference cannot be compared pixel-for-pixel.
    #[error(
        "image dimensions mismatch: candidate {candidate_dims:?} vs reference {reference_dims:?}"
    )]
    DimensionMismatch {
        candidate_dims: (u32, u32),
        reference_dims: (u32, u32),
    },

    /// Screenshot comparison exceeded the allowed mismatch.
    #[error(
        "screenshot mismatch {actual}% exceeds allowed {allowed}% \
         (candidate kept at {candidate})"
    )]
    MismatchExceeded {
        allowed: f64,
        actual: f64,
        candidate: PathBuf,
    },

    /// A required external binary could not be located.
    #[error("could not locate '{name}'. Checked:\n{checked}")]
    BinaryNotFound { name: String, checked: String },

    /// An external tool exited non-zero.
    #[error("{tool} failed: {stderr}")]
    ToolFailed { tool: String, stderr: String },

    /// An external tool produced output we could not interpret.
    #[error("unexpected output from {tool}: {reason}")]
    ToolOutput { tool: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Whether the operation may have partially succeeded and the caller can
    /// reasonably continue (as opposed to a hard failure).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::ShutdownUnconfirmed { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_configured_message_mentions_configuration() {
        let err = Error::SimulatorNotConfigured {
            name: "iPhone 15".to_string(),
            version: "17.5".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("iPhone 15"));
        assert!(msg.contains("may not be configured"));
    }

    #[test]
    fn test_mismatch_message_carries_both_percentages() {
        let err = Error::MismatchExceeded {
            allowed: 0.2,
            actual: 0.35,
            candidate: PathBuf::from("/tmp/Home_Test.png"),
        };
        let msg = err.to_string();
        assert!(msg.contains("0.2"));
        assert!(msg.contains("0.35"));
    }

    #[test]
    fn test_only_timeout_is_recoverable() {
        let timeout = Error::ShutdownUnconfirmed {
            device: "iPhone 15".to_string(),
            last_state: "Booted".to_string(),
            attempts: 20,
        };
        assert!(timeout.is_recoverable());
        assert!(!Error::EmulatorNotRunning("Pixel_7".to_string()).is_recoverable());
    }
}
