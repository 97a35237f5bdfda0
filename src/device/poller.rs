//! Bounded-retry state polling
//!
//! Simulators flap between "Booted" and "Shutdown" in the window right after
//! a shutdown request, so a single state read proves nothing. The poller
//! waits out that window, then probes on a fixed cadence until the target
//! state is observed or the attempt budget runs out. Total wall time is
//! bounded by `initial_wait + max_attempts * interval` regardless of what the
//! device reports.

use crate::error::Result;
use std::future::Future;
use std::time::Duration;

/// Poll timing parameters. Immutable once built; supplied by the caller.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Settle time before the first state check
    pub initial_wait: Duration,
    /// Fixed cadence between checks
    pub interval: Duration,
    /// Attempt budget
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_wait: Duration::from_millis(2000),
            interval: Duration::from_millis(1000),
            max_attempts: 20,
        }
    }
}

impl PollConfig {
    /// Upper bound on total poll duration
    pub fn max_total(&self) -> Duration {
        self.initial_wait + self.interval * self.max_attempts
    }
}

/// Terminal poll states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Target state observed on check number `attempts`
    Confirmed { attempts: u32 },
    /// Budget exhausted; `last_state` is the final observation
    TimedOut { last_state: String, attempts: u32 },
}

impl PollOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, PollOutcome::Confirmed { .. })
    }
}

/// Poll `probe` until it reports `target` exactly, or the budget runs out.
///
/// Checks are strictly sequential: each one waits out a full `interval`
/// before probing, so only one probe is ever in flight. Probe failures
/// propagate immediately - an unreadable registry is not a state observation.
pub async fn await_state<F, Fut>(target: &str, config: &PollConfig, mut probe: F) -> Result<PollOutcome>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String>>,
{
    tokio::time::sleep(config.initial_wait).await;

    let mut last_state = String::from("unknown");
    for attempt in 1..=config.max_attempts {
        tokio::time::sleep(config.interval).await;

        let state = probe().await?;
        if state == target {
            return Ok(PollOutcome::Confirmed { attempts: attempt });
        }
        last_state = state;
    }

    Ok(PollOutcome::TimedOut {
        last_state,
        attempts: config.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    fn fast_config(max_attempts: u32) -> PollConfig {
        PollConfig {
            initial_wait: Duration::from_millis(0),
            interval: Duration::from_millis(10),
            max_attempts,
        }
    }

    #[tokio::test]
    async fn test_never_reaching_target_times_out_within_bound() {
        let config = fast_config(3);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let start = Instant::now();
        let outcome = await_state("Shutdown", &config, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok("Booted".to_string()) }
        })
        .await
        .unwrap();

        assert_eq!(
            outcome,
            PollOutcome::TimedOut {
                last_state: "Booted".to_string(),
                attempts: 3
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= Duration::from_millis(30));
        // generous scheduling slack, but nowhere near a hang
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_flapping_device_confirms_on_third_check() {
        let config = fast_config(3);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let outcome = await_state("Shutdown", &config, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                let state = if n < 2 { "Booted" } else { "Shutdown" };
                Ok(state.to_string())
            }
        })
        .await
        .unwrap();

        assert_eq!(outcome, PollOutcome::Confirmed { attempts: 3 });
    }

    #[tokio::test]
    async fn test_immediate_match_stops_polling() {
        let config = fast_config(20);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let outcome = await_state("Shutdown", &config, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok("Shutdown".to_string()) }
        })
        .await
        .unwrap();

        assert_eq!(outcome, PollOutcome::Confirmed { attempts: 1 });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_probe_error_propagates() {
        let config = fast_config(5);
        let result = await_state("Shutdown", &config, || async {
            Err(Error::ToolFailed {
                tool: "xcrun simctl".to_string(),
                stderr: "boom".to_string(),
            })
        })
        .await;

        assert!(result.is_err());
    }

    #[test]
    fn test_max_total_bound() {
        let config = PollConfig {
            initial_wait: Duration::from_millis(100),
            interval: Duration::from_millis(50),
            max_attempts: 20,
        };
        assert_eq!(config.max_total(), Duration::from_millis(1100));
    }
}
