//! Background eviction of idle key state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use super::limiter::RateLimiter;
use crate::clock::Clock;
use crate::error::{AdmissionError, Result};

/// Handle to a running sweeper task.
///
/// Dropping the handle also stops the task; [`Sweeper::shutdown`] stops it
/// and waits for it to exit.
#[derive(Debug)]
pub struct Sweeper {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Sweeper {
    /// Spawn a task calling [`RateLimiter::sweep`] every `every`.
    ///
    /// Must be called from within a tokio runtime. A zero interval is
    /// rejected.
    pub fn spawn(
        limiter: Arc<RateLimiter>,
        clock: Arc<dyn Clock>,
        every: Duration,
    ) -> Result<Self> {
        if every.is_zero() {
            return Err(AdmissionError::Config(
                "sweep interval must be greater than zero".to_string(),
            ));
        }

        let (stop, mut stopped) = watch::channel(false);

        info!(interval_ms = every.as_millis() as u64, "Starting rate limit sweeper");

        let task = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = limiter.sweep(clock.now_ms());
                        debug!(removed = removed, remaining = limiter.key_count(), "Sweep finished");
                    }
                    _ = stopped.changed() => break,
                }
            }

            info!("Rate limit sweeper stopped");
        });

        Ok(Self { stop, task })
    }

    /// Stop the task and wait for it to finish.
    ///
    /// Fails if the task panicked.
    pub async fn shutdown(self) -> Result<()> {
        // The task may already be gone; its join result is what matters.
        let _ = self.stop.send(true);

        match self.task.await {
            Ok(()) => Ok(()),
            Err(e) if e.is_panic() => {
                error!(error = %e, "Rate limit sweeper panicked");
                Err(AdmissionError::Task(format!("sweeper panicked: {}", e)))
            }
            Err(e) => {
                debug!(error = %e, "Rate limit sweeper was cancelled");
                Ok(())
            }
        }
    }
}
