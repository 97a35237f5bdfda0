//! OS process-list queries for Android emulators
//!
//! The emulator has no registry equivalent to simctl, so resolution goes
//! through the live process list. On Windows the AVD name is not visible in
//! `tasklist` output, so matching falls back to the fixed qemu image name;
//! everywhere else the AVD name appears in the process command line.

use crate::error::{Error, Result};
use std::process::Stdio;
use tokio::process::Command;

/// Process image name the emulator runs under on Windows
pub const WINDOWS_EMULATOR_IMAGE: &str = "qemu-system-x86_64.exe";

/// One row of the OS process list
#[derive(Debug, Clone)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub cmd: String,
}

/// Parse `ps -axo pid=,comm=,args=` output
pub fn parse_ps(output: &str) -> Vec<ProcessRecord> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let pid = parts.next()?.parse().ok()?;
            let name = parts.next()?.to_string();
            let cmd = parts.collect::<Vec<_>>().join(" ");
            Some(ProcessRecord { pid, name, cmd })
        })
        .collect()
}

/// Parse `tasklist /fo csv /nh` output ("name","pid","session",...)
pub fn parse_tasklist(output: &str) -> Vec<ProcessRecord> {
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line
                .split("\",\"")
                .map(|f| f.trim_matches(|c| c == '"' || c == '\r'))
                .collect();
            if fields.len() < 2 {
                return None;
            }
            let pid = fields[1].parse().ok()?;
            Some(ProcessRecord {
                pid,
                name: fields[0].to_string(),
                // tasklist does not expose the command line
                cmd: String::new(),
            })
        })
        .collect()
}

/// Pick the emulator process for an AVD out of a process list.
///
/// Platform-dependent on purpose: `match_by_image=true` (Windows) matches the
/// fixed qemu image name since the AVD name never reaches the process list;
/// otherwise the AVD name is matched as a substring of the command line.
pub fn match_emulator<'a>(
    records: &'a [ProcessRecord],
    avd_name: &str,
    match_by_image: bool,
) -> Option<&'a ProcessRecord> {
    if match_by_image {
        records
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(WINDOWS_EMULATOR_IMAGE))
    } else {
        records.iter().find(|r| r.cmd.contains(avd_name))
    }
}

async fn run_listing(tool: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(tool)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(Error::ToolFailed {
            tool: tool.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Snapshot the live OS process list
pub async fn list_processes() -> Result<Vec<ProcessRecord>> {
    if cfg!(windows) {
        let out = run_listing("tasklist", &["/fo", "csv", "/nh"]).await?;
        Ok(parse_tasklist(&out))
    } else {
        let out = run_listing("ps", &["-axo", "pid=,comm=,args="]).await?;
        Ok(parse_ps(&out))
    }
}

/// Resolve a running emulator's PID from its AVD name
pub async fn emulator_pid(avd_name: &str) -> Result<u32> {
    if avd_name.is_empty() {
        return Err(Error::InvalidArgument(
            "AVD name must not be empty".to_string(),
        ));
    }
    let records = list_processes().await?;
    match_emulator(&records, avd_name, cfg!(windows))
        .map(|r| r.pid)
        .ok_or_else(|| Error::EmulatorNotRunning(avd_name.to_string()))
}

/// Force-kill a process by PID via the platform kill tool
pub async fn kill_pid(pid: u32) -> Result<()> {
    let pid_str = pid.to_string();
    let (tool, args): (&str, Vec<&str>) = if cfg!(windows) {
        ("taskkill", vec!["/F", "/PID", &pid_str])
    } else {
        ("kill", vec!["-9", &pid_str])
    };

    let output = Command::new(tool)
        .args(&args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(Error::ToolFailed {
            tool: tool.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PS_OUTPUT: &str = "\
  401 /sbin/launchd      /sbin/launchd
 8812 qemu-system-aarch64 /opt/emulator/qemu/qemu-system-aarch64 -avd Pixel_7_API_34 -netdelay none
 9033 adb                adb -L tcp:5037 fork-server server
";

    const TASKLIST_OUTPUT: &str = "\
\"System Idle Process\",\"0\",\"Services\",\"0\",\"8 K\"\r
\"qemu-system-x86_64.exe\",\"7712\",\"Console\",\"1\",\"1,903,216 K\"\r
\"adb.exe\",\"8120\",\"Console\",\"1\",\"12,004 K\"\r
";

    #[test]
    fn test_parse_ps() {
        let records = parse_ps(PS_OUTPUT);
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].pid, 8812);
        assert_eq!(records[1].name, "qemu-system-aarch64");
        assert!(records[1].cmd.contains("-avd Pixel_7_API_34"));
    }

    #[test]
    fn test_parse_tasklist() {
        let records = parse_tasklist(TASKLIST_OUTPUT);
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].name, "qemu-system-x86_64.exe");
        assert_eq!(records[1].pid, 7712);
    }

    #[test]
    fn test_match_by_cmdline_substring() {
        let records = parse_ps(PS_OUTPUT);
        let hit = match_emulator(&records, "Pixel_7_API_34", false).unwrap();
        assert_eq!(hit.pid, 8812);
        assert!(match_emulator(&records, "Pixel_5_API_30", false).is_none());
    }

    #[test]
    fn test_match_by_fixed_image_name() {
        let records = parse_tasklist(TASKLIST_OUTPUT);
        // AVD name is irrelevant on Windows - the image name decides
        let hit = match_emulator(&records, "whatever", true).unwrap();
        assert_eq!(hit.pid, 7712);
    }

    #[test]
    fn test_no_match_is_none_never_default() {
        let records = parse_ps("  12 bash /bin/bash\n");
        assert!(match_emulator(&records, "Pixel_7_API_34", false).is_none());
        assert!(match_emulator(&records, "Pixel_7_API_34", true).is_none());
    }
}
