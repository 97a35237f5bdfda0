//! Device lifecycle management
//!
//! Module-level entry points for shutting down simulators and emulators and
//! querying simulator state. Handles are resolved fresh for every call and
//! never cached - the registry snapshot is only trustworthy at the moment it
//! is taken.

pub mod poller;
pub mod process;
pub mod simctl;

use crate::error::{Error, Result};
use poller::{PollConfig, PollOutcome};

/// Platform-native identifier for a resolved device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeId {
    Udid(String),
    Pid(u32),
}

/// A device resolved from the registry/process snapshot for a single call
#[derive(Debug, Clone)]
pub struct DeviceHandle {
    pub name: String,
    pub version: Option<(u32, u32)>,
    pub native_id: NativeId,
}

impl DeviceHandle {
    fn require_udid(&self) -> Result<&str> {
        match &self.native_id {
            NativeId::Udid(udid) => Ok(udid),
            NativeId::Pid(_) => Err(Error::InvalidArgument(format!(
                "'{}' resolved to a process, not a simulator",
                self.name
            ))),
        }
    }

    fn require_pid(&self) -> Result<u32> {
        match &self.native_id {
            NativeId::Pid(pid) => Ok(*pid),
            NativeId::Udid(_) => Err(Error::InvalidArgument(format!(
                "'{}' resolved to a simulator, not a process",
                self.name
            ))),
        }
    }
}

/// Resolve an iOS simulator to a handle. Failing to resolve is a hard error.
pub async fn resolve_ios(name: &str, major: u32, minor: u32) -> Result<DeviceHandle> {
    let udid = simctl::udid_for(name, major, minor).await?;
    Ok(DeviceHandle {
        name: name.to_string(),
        version: Some((major, minor)),
        native_id: NativeId::Udid(udid),
    })
}

/// Resolve a running Android emulator to a handle
pub async fn resolve_android(avd_name: &str) -> Result<DeviceHandle> {
    let pid = process::emulator_pid(avd_name).await?;
    Ok(DeviceHandle {
        name: avd_name.to_string(),
        version: None,
        native_id: NativeId::Pid(pid),
    })
}

/// Query the reported state of a named simulator
pub async fn ios_simulator_state(name: &str, major: u32, minor: u32) -> Result<String> {
    let handle = resolve_ios(name, major, minor).await?;
    simctl::device_state(handle.require_udid()?).await
}

/// Shut down a simulator and poll until the shutdown has stabilized.
///
/// Returns the warning-class [`Error::ShutdownUnconfirmed`] when the poll
/// budget runs out - the shutdown request was issued, so the operation may
/// have partially succeeded. Either way a trailing best-effort kill of the
/// Simulator UI process runs, and its failure is never propagated.
pub async fn kill_ios_simulator(
    name: &str,
    major: u32,
    minor: u32,
    config: &PollConfig,
) -> Result<()> {
    let handle = resolve_ios(name, major, minor).await?;
    let udid = handle.require_udid()?.to_string();

    simctl::shutdown(&udid).await?;

    let outcome = poller::await_state("Shutdown", config, move || {
        let udid = udid.clone();
        async move { simctl::device_state(&udid).await }
    })
    .await?;

    kill_simulator_ui().await;

    match outcome {
        PollOutcome::Confirmed { attempts } => {
            log::info!("{} confirmed Shutdown after {} checks", name, attempts);
            Ok(())
        }
        PollOutcome::TimedOut {
            last_state,
            attempts,
        } => Err(Error::ShutdownUnconfirmed {
            device: name.to_string(),
            last_state,
            attempts,
        }),
    }
}

/// Kill a running emulator by AVD name
pub async fn kill_android_emulator(avd_name: &str) -> Result<()> {
    let handle = resolve_android(avd_name).await?;
    process::kill_pid(handle.require_pid()?).await
}

/// Fire-and-forget kill of any lingering Simulator UI process
async fn kill_simulator_ui() {
    let result = tokio::process::Command::new("killall")
        .arg("Simulator")
        .output()
        .await;
    if let Err(e) = result {
        log::debug!("Simulator UI cleanup skipped: {}", e);
    }
}
