//! External binary resolution
//!
//! Resolves the tools the harness shells out to. The install directory
//! (`~/.appium-harness`) wins over the system PATH so a pinned toolchain can
//! be dropped in without touching the environment. Every checked location is
//! reported when resolution fails.

use crate::error::{Error, Result};
use std::path::PathBuf;

/// `~/.appium-harness`
pub fn install_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".appium-harness"))
}

/// Locate a binary by name, install directory first, then system PATH
pub fn find_binary(name: &str) -> Result<PathBuf> {
    let mut checked_paths = Vec::new();

    if let Some(dir) = install_dir() {
        let candidates = [dir.join("bin").join(name), dir.join(name)];
        for candidate in candidates {
            checked_paths.push(format!("Install dir: {}", candidate.display()));
            if candidate.exists() {
                return Ok(candidate);
            }
        }
    }

    if let Ok(path) = which::which(name) {
        return Ok(path);
    }
    checked_paths.push(format!("System PATH: {}", name));

    Err(Error::BinaryNotFound {
        name: name.to_string(),
        checked: checked_paths.join("\n"),
    })
}

/// Locate `xcrun` (simctl front-end, macOS only)
pub fn find_xcrun() -> Result<PathBuf> {
    find_binary("xcrun")
}

/// Locate the ADB binary
pub fn find_adb() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        find_binary("adb.exe").or_else(|_| find_binary("adb"))
    }
    #[cfg(not(windows))]
    {
        find_binary("adb")
    }
}

/// Locate the Appium server launcher.
///
/// Checks a project-local npm install under the install dir before PATH.
pub fn find_appium() -> Result<PathBuf> {
    if let Some(dir) = install_dir() {
        let npm_local = dir
            .join("node_modules")
            .join(".bin")
            .join(if cfg!(windows) { "appium.cmd" } else { "appium" });
        if npm_local.exists() {
            return Ok(npm_local);
        }
    }
    #[cfg(windows)]
    {
        find_binary("appium.cmd").or_else(|_| find_binary("appium"))
    }
    #[cfg(not(windows))]
    {
        find_binary("appium")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_reports_checked_paths() {
        let err = find_binary("definitely-not-a-real-binary-name").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("definitely-not-a-real-binary-name"));
        assert!(msg.contains("Checked"));
    }
}
