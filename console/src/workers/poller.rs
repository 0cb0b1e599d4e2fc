//! Polling worker for periodic snapshot refresh

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::remote::Orchestrator;
use crate::sync::syncer::{RefreshOutcome, Syncer};

/// Poller worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Polling interval
    pub interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

/// Run the poller worker.
///
/// Fetches once immediately, then on every `interval` and on every on-demand
/// request from `refresh_rx`. All fetches happen on this task, so two polls
/// never overlap. On-demand requests do not reset the interval timer.
pub async fn run<R, S, F>(
    options: &Options,
    syncer: &Syncer<R>,
    epoch: u64,
    sleep_fn: S,
    mut refresh_rx: mpsc::Receiver<()>,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    R: Orchestrator + ?Sized,
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Poller worker starting (epoch {})...", epoch);

    if !poll(syncer, epoch, &mut shutdown_signal).await {
        return;
    }

    let mut tick = Box::pin(sleep_fn(options.interval));
    let mut refresh_open = true;

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Poller worker shutting down...");
                return;
            }
            _ = &mut tick => {
                tick.set(sleep_fn(options.interval));
                debug!("Scheduled poll");
            }
            request = refresh_rx.recv(), if refresh_open => {
                if request.is_none() {
                    refresh_open = false;
                    continue;
                }
                debug!("On-demand poll");
            }
        }

        if !poll(syncer, epoch, &mut shutdown_signal).await {
            return;
        }
    }
}

/// Returns false if shutdown fired while the fetch was in flight
async fn poll<R>(
    syncer: &Syncer<R>,
    epoch: u64,
    shutdown_signal: &mut Pin<Box<dyn Future<Output = ()> + Send>>,
) -> bool
where
    R: Orchestrator + ?Sized,
{
    tokio::select! {
        _ = shutdown_signal => {
            info!("Poller worker shutting down mid-poll...");
            false
        }
        result = syncer.refresh(epoch) => {
            match result {
                Ok(RefreshOutcome::Applied) => debug!("Poll applied"),
                Ok(RefreshOutcome::Discarded) => debug!("Poll discarded"),
                // Already reported by the syncer; the next tick tries again
                Err(_) => {}
            }
            true
        }
    }
}
