//! `xcrun simctl` registry queries
//!
//! Resolves symbolic simulator names to UDIDs and reads reported device
//! state from the JSON registry snapshot. All queries are read-only; the
//! only mutations are explicit `shutdown`/`boot` requests.

use crate::error::{Error, Result};
use crate::utils::binary_resolver;
use serde::Deserialize;
use std::collections::HashMap;
use std::process::Stdio;
use tokio::process::Command;

/// One simulator entry as reported by `simctl list devices -j`
#[derive(Debug, Clone, Deserialize)]
pub struct SimDevice {
    pub udid: String,
    pub name: String,
    pub state: String,
}

/// Registry snapshot: devices keyed by runtime identifier
#[derive(Debug, Deserialize)]
pub struct DeviceList {
    pub devices: HashMap<String, Vec<SimDevice>>,
}

/// Runtime key simctl uses for a given iOS version,
/// e.g. `com.apple.CoreSimulator.SimRuntime.iOS-17-5`
pub fn runtime_key(major: u32, minor: u32) -> String {
    format!("com.apple.CoreSimulator.SimRuntime.iOS-{}-{}", major, minor)
}

async fn run_simctl(args: &[&str]) -> Result<Vec<u8>> {
    let xcrun = binary_resolver::find_xcrun()?;
    let output = Command::new(xcrun)
        .arg("simctl")
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(Error::ToolFailed {
            tool: "xcrun simctl".to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output.stdout)
}

/// Fetch the current registry snapshot
pub async fn list_devices() -> Result<DeviceList> {
    let stdout = run_simctl(&["list", "devices", "-j"]).await?;
    Ok(serde_json::from_slice(&stdout)?)
}

/// Exact-name lookup within a version bucket of a parsed snapshot.
///
/// Split out from [`udid_for`] so the matching rules are testable without a
/// live simctl.
pub fn resolve_udid(list: &DeviceList, name: &str, major: u32, minor: u32) -> Result<String> {
    let not_configured = || Error::SimulatorNotConfigured {
        name: name.to_string(),
        version: format!("{}.{}", major, minor),
    };

    let bucket = list
        .devices
        .get(&runtime_key(major, minor))
        .ok_or_else(not_configured)?;

    bucket
        .iter()
        .find(|d| d.name == name)
        .map(|d| d.udid.clone())
        .ok_or_else(not_configured)
}

/// Resolve a symbolic simulator name to its UDID
pub async fn udid_for(name: &str, major: u32, minor: u32) -> Result<String> {
    if name.is_empty() {
        return Err(Error::InvalidArgument(
            "simulator name must not be empty".to_string(),
        ));
    }
    let list = list_devices().await?;
    resolve_udid(&list, name, major, minor)
}

/// Find the reported state for a UDID in a parsed snapshot
pub fn state_of(list: &DeviceList, udid: &str) -> Option<String> {
    list.devices
        .values()
        .flatten()
        .find(|d| d.udid == udid)
        .map(|d| d.state.clone())
}

/// Query the current enumerated state ("Booted", "Shutdown", ...) of a device
pub async fn device_state(udid: &str) -> Result<String> {
    let list = list_devices().await?;
    state_of(&list, udid).ok_or_else(|| Error::ToolOutput {
        tool: "xcrun simctl".to_string(),
        reason: format!("device {} missing from registry snapshot", udid),
    })
}

/// Request an asynchronous shutdown. Already-shut-down is not an error.
pub async fn shutdown(udid: &str) -> Result<()> {
    match run_simctl(&["shutdown", udid]).await {
        Ok(_) => Ok(()),
        Err(Error::ToolFailed { stderr, .. }) if stderr.contains("current state: Shutdown") => {
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Boot a simulator. Already-booted is not an error.
pub async fn boot(udid: &str) -> Result<()> {
    match run_simctl(&["boot", udid]).await {
        Ok(_) => Ok(()),
        Err(Error::ToolFailed { stderr, .. }) if stderr.contains("current state: Booted") => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "devices": {
            "com.apple.CoreSimulator.SimRuntime.iOS-17-5": [
                {"udid": "AAAA-1111", "name": "iPhone 15", "state": "Booted"},
                {"udid": "BBBB-2222", "name": "iPhone 15 Pro", "state": "Shutdown"}
            ],
            "com.apple.CoreSimulator.SimRuntime.iOS-16-4": [
                {"udid": "CCCC-3333", "name": "iPhone 14", "state": "Shutdown"}
            ]
        }
    }"#;

    fn snapshot() -> DeviceList {
        serde_json::from_str(SNAPSHOT).unwrap()
    }

    #[test]
    fn test_runtime_key() {
        assert_eq!(
            runtime_key(17, 5),
            "com.apple.CoreSimulator.SimRuntime.iOS-17-5"
        );
    }

    #[test]
    fn test_resolve_udid_exact_match() {
        let list = snapshot();
        assert_eq!(resolve_udid(&list, "iPhone 15", 17, 5).unwrap(), "AAAA-1111");
        assert_eq!(
            resolve_udid(&list, "iPhone 15 Pro", 17, 5).unwrap(),
            "BBBB-2222"
        );
        assert_eq!(resolve_udid(&list, "iPhone 14", 16, 4).unwrap(), "CCCC-3333");
    }

    #[test]
    fn test_resolve_udid_missing_version_bucket() {
        let list = snapshot();
        let err = resolve_udid(&list, "iPhone 15", 18, 0).unwrap_err();
        assert!(matches!(err, Error::SimulatorNotConfigured { .. }));
        assert!(err.to_string().contains("18.0"));
    }

    #[test]
    fn test_resolve_udid_name_not_in_bucket() {
        let list = snapshot();
        let err = resolve_udid(&list, "iPhone 14", 17, 5).unwrap_err();
        assert!(matches!(err, Error::SimulatorNotConfigured { .. }));
    }

    #[test]
    fn test_state_lookup_spans_runtimes() {
        let list = snapshot();
        assert_eq!(state_of(&list, "AAAA-1111").as_deref(), Some("Booted"));
        assert_eq!(state_of(&list, "CCCC-3333").as_deref(), Some("Shutdown"));
        assert!(state_of(&list, "ZZZZ-0000").is_none());
    }

    #[test]
    fn test_empty_snapshot_parses() {
        let list: DeviceList = serde_json::from_str(r#"{"devices": {}}"#).unwrap();
        assert!(list.devices.is_empty());
    }
}
