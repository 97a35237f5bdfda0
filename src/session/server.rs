//! Appium server bootstrap
//!
//! Spawns the `appium` binary as a child process, redirects its output to a
//! timestamped log file, and waits for the /status endpoint to report ready
//! before handing the URL to callers.

use crate::error::{Error, Result};
use crate::session::client::AppiumClient;
use crate::utils::binary_resolver;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};

/// Default Appium listen port
pub const DEFAULT_PORT: u16 = 4723;

/// How many times to probe /status before giving up
const READY_ATTEMPTS: u32 = 30;
const READY_INTERVAL: Duration = Duration::from_millis(1000);

pub struct AppiumServer {
    child: Child,
    base_url: String,
    log_path: PathBuf,
}

impl AppiumServer {
    /// Spawn an Appium server on `port` and wait until it reports ready
    pub async fn start(port: u16) -> Result<Self> {
        let appium = binary_resolver::find_appium()?;

        let log_path = std::env::temp_dir().join(format!(
            "appium-{}.log",
            chrono::Local::now().format("%Y%m%d-%H%M%S")
        ));
        let log_file = std::fs::File::create(&log_path)?;
        let log_err = log_file.try_clone()?;

        let child = Command::new(appium)
            .args(["--port", &port.to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(log_err))
            .kill_on_drop(true)
            .spawn()?;

        let base_url = format!("http://127.0.0.1:{}", port);
        let mut server = Self {
            child,
            base_url,
            log_path,
        };

        let probe = AppiumClient::new(&server.base_url);
        for _ in 0..READY_ATTEMPTS {
            tokio::time::sleep(READY_INTERVAL).await;
            if probe.status_ready().await {
                log::info!("appium ready at {}", server.base_url);
                return Ok(server);
            }
            // bail out early if the process already died
            if let Some(status) = server.child.try_wait()? {
                return Err(Error::ToolFailed {
                    tool: "appium".to_string(),
                    stderr: format!(
                        "exited with {} before becoming ready; see {}",
                        status,
                        server.log_path.display()
                    ),
                });
            }
        }

        let _ = server.child.start_kill();
        Err(Error::ToolFailed {
            tool: "appium".to_string(),
            stderr: format!(
                "did not report ready within {} checks; see {}",
                READY_ATTEMPTS,
                server.log_path.display()
            ),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn log_path(&self) -> &PathBuf {
        &self.log_path
    }

    /// Terminate the server process and wait for it to exit
    pub async fn stop(mut self) -> Result<()> {
        self.child.start_kill()?;
        self.child.wait().await?;
        Ok(())
    }
}
