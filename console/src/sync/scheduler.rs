//! Poll scheduler lifecycle

use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::remote::Orchestrator;
use crate::sync::syncer::Syncer;
use crate::workers::poller;

/// Something that can ask for an out-of-band snapshot refresh
pub trait RefreshTrigger: Send + Sync {
    /// Request a refresh. Returns false if nothing is polling.
    fn refresh_now(&self) -> bool;
}

struct ActiveLoop {
    refresh_tx: mpsc::Sender<()>,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Owns the poller task: `start` spawns it, `stop` tears it down
pub struct PollScheduler<R: Orchestrator + ?Sized + 'static> {
    syncer: Arc<Syncer<R>>,
    options: poller::Options,
    active: Mutex<Option<ActiveLoop>>,
}

impl<R: Orchestrator + ?Sized + 'static> PollScheduler<R> {
    pub fn new(syncer: Arc<Syncer<R>>, options: poller::Options) -> Self {
        Self {
            syncer,
            options,
            active: Mutex::new(None),
        }
    }

    /// Start polling: one fetch now, then one per interval.
    /// Returns false if already running.
    pub fn start(&self) -> bool {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if active.is_some() {
            return false;
        }

        let epoch = self.syncer.begin_epoch();
        if self.syncer.store().snapshot().revision == 0 {
            self.syncer.store().set_loading(true);
        }

        // Capacity 1: requests made while one is already queued collapse into it
        let (refresh_tx, refresh_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let syncer = self.syncer.clone();
        let options = self.options.clone();

        let handle = tokio::spawn(async move {
            poller::run(
                &options,
                syncer.as_ref(),
                epoch,
                tokio::time::sleep,
                refresh_rx,
                Box::pin(async move {
                    let _ = shutdown_rx.await;
                }),
            )
            .await;
        });

        info!("Poll scheduler started ({:?} interval)", self.options.interval);
        *active = Some(ActiveLoop {
            refresh_tx,
            shutdown_tx,
            handle,
        });
        true
    }

    /// Stop polling. No fetch fires and no response is applied afterwards.
    pub fn stop(&self) {
        let active = self
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        let Some(active) = active else {
            return;
        };

        self.syncer.end_epoch();
        let _ = active.shutdown_tx.send(());
        active.handle.abort();
        info!("Poll scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    pub fn syncer(&self) -> &Arc<Syncer<R>> {
        &self.syncer
    }
}

impl<R: Orchestrator + ?Sized + 'static> RefreshTrigger for PollScheduler<R> {
    fn refresh_now(&self) -> bool {
        let active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        let Some(active) = active.as_ref() else {
            debug!("Refresh requested while scheduler is stopped");
            return false;
        };

        match active.refresh_tx.try_send(()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(())) => {
                debug!("Refresh already pending, collapsing request");
                true
            }
            Err(mpsc::error::TrySendError::Closed(())) => false,
        }
    }
}

impl<R: Orchestrator + ?Sized + 'static> Drop for PollScheduler<R> {
    fn drop(&mut self) {
        self.stop();
    }
}
