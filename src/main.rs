use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use appium_harness::device::{self, poller::PollConfig, process, simctl};
use appium_harness::session::{parse_version, server::AppiumServer};
use appium_harness::utils::config::HarnessConfig;
use appium_harness::visual::compare;

#[derive(Parser)]
#[command(name = "appium-harness")]
#[command(author = "NL QA Team")]
#[command(version = "0.1.0")]
#[command(about = "Mobile device lifecycle and visual-testing harness", long_about = None)]
struct Cli {
    /// Optional YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured simulators or running emulator processes
    Devices {
        /// Target platform (ios, android)
        #[arg(short, long, default_value = "ios")]
        platform: String,
    },

    /// Shut down a simulator or kill an emulator, confirming the result
    Kill {
        /// Target platform (ios, android)
        #[arg(short, long)]
        platform: String,

        /// Simulator name or AVD name
        #[arg(short, long)]
        name: String,

        /// Platform version, e.g. 17.5 (iOS only)
        #[arg(short, long)]
        version: Option<String>,

        /// Override the shutdown-poll attempt budget
        #[arg(long)]
        attempts: Option<u32>,
    },

    /// Query the reported state of a simulator
    State {
        /// Simulator name
        #[arg(short, long)]
        name: String,

        /// Platform version, e.g. 17.5
        #[arg(short, long)]
        version: String,
    },

    /// Run an Appium server until Ctrl-C
    Server {
        /// Listen port (config default when omitted)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Compare two image files
    Compare {
        /// Candidate image path
        candidate: PathBuf,

        /// Reference image path
        reference: PathBuf,

        /// Allowed mismatch percent
        #[arg(short, long)]
        threshold: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::default(),
    };

    match cli.command {
        Commands::Devices { platform } => list_devices(&platform).await,
        Commands::Kill {
            platform,
            name,
            version,
            attempts,
        } => {
            let mut poll = config.poll_config();
            if let Some(n) = attempts {
                poll.max_attempts = n;
            }
            kill_device(&platform, &name, version.as_deref(), &poll).await
        }
        Commands::State { name, version } => {
            let (major, minor) = parse_version(&version);
            let state = device::ios_simulator_state(&name, major, minor).await?;
            println!("{} {} is {}", "●".blue(), name, state.as_str().bold());
            Ok(())
        }
        Commands::Server { port } => run_server(port.unwrap_or(config.appium_port)).await,
        Commands::Compare {
            candidate,
            reference,
            threshold,
        } => {
            let mismatch = compare::compare_files(&candidate, &reference)?;
            let result = compare::verdict(mismatch, threshold.unwrap_or(config.compare_threshold));
            if result.passed {
                println!(
                    "{} mismatch {:.2}% within threshold",
                    "✓".green(),
                    result.mismatch_percent
                );
                Ok(())
            } else {
                anyhow::bail!("mismatch {:.2}% exceeds threshold", result.mismatch_percent);
            }
        }
    }
}

async fn list_devices(platform: &str) -> anyhow::Result<()> {
    match platform {
        "ios" => {
            let list = simctl::list_devices().await?;
            if list.devices.is_empty() {
                println!("No simulators configured.");
                return Ok(());
            }
            let mut runtimes: Vec<_> = list.devices.iter().collect();
            runtimes.sort_by(|a, b| a.0.cmp(b.0));
            for (runtime, devices) in runtimes {
                let label = runtime.rsplit('.').next().unwrap_or(runtime);
                println!("{}", label.bold());
                for d in devices {
                    println!("  {} - {} ({})", d.udid, d.name, d.state);
                }
            }
        }
        "android" => {
            let records = process::list_processes().await?;
            let emulators: Vec<_> = records
                .iter()
                .filter(|r| r.name.contains("qemu") || r.cmd.contains("-avd"))
                .collect();
            if emulators.is_empty() {
                println!("No emulator processes running.");
            } else {
                println!("Running emulator processes:");
                for r in emulators {
                    println!("  {} - {} {}", r.pid, r.name, r.cmd);
                }
            }
        }
        _ => anyhow::bail!("Unknown platform: {}", platform),
    }
    Ok(())
}

async fn kill_device(
    platform: &str,
    name: &str,
    version: Option<&str>,
    poll: &PollConfig,
) -> anyhow::Result<()> {
    match platform {
        "ios" => {
            let version = version
                .ok_or_else(|| anyhow::anyhow!("--version is required for iOS simulators"))?;
            let (major, minor) = parse_version(version);

            let spinner = indicatif::ProgressBar::new_spinner();
            spinner.set_message(format!("Shutting down {}...", name));
            spinner.enable_steady_tick(std::time::Duration::from_millis(100));

            let result = device::kill_ios_simulator(name, major, minor, poll).await;
            spinner.finish_and_clear();

            match result {
                Ok(()) => {
                    println!("{} {} shut down", "✓".green(), name);
                    Ok(())
                }
                Err(e) if e.is_recoverable() => {
                    println!("{} {}", "⚠".yellow(), e);
                    Ok(())
                }
                Err(e) => Err(e.into()),
            }
        }
        "android" => {
            device::kill_android_emulator(name).await?;
            println!("{} emulator {} killed", "✓".green(), name);
            Ok(())
        }
        _ => anyhow::bail!("Unknown platform: {}", platform),
    }
}

async fn run_server(port: u16) -> anyhow::Result<()> {
    let server = AppiumServer::start(port).await?;
    println!(
        "{} Appium ready at {} (log: {})",
        "✓".green(),
        server.base_url(),
        server.log_path().display()
    );
    println!("Press Ctrl-C to stop.");

    let (tx, rx) = std::sync::mpsc::channel::<()>();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })?;
    tokio::task::spawn_blocking(move || rx.recv()).await??;

    server.stop().await?;
    println!("{} Appium stopped", "✓".green());
    Ok(())
}
