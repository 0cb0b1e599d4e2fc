//! Snapshot synchronization

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use crate::errors::ConsoleError;
use crate::remote::Orchestrator;
use crate::sync::store::SnapshotStore;

/// Sync bookkeeping
#[derive(Debug, Clone, Default)]
pub struct SyncState {
    pub last_attempted_sync_at: Option<DateTime<Utc>>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub err_streak: u32,
    pub last_error: Option<String>,
}

/// Outcome of one refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The snapshot was replaced
    Applied,

    /// The response arrived for a poll lifecycle that has since ended
    Discarded,
}

#[derive(Debug, Default)]
struct Epochs {
    next: u64,
    active: Option<u64>,
}

/// Pulls snapshots from the orchestrator into the store.
///
/// Scheduled refreshes carry the epoch of the scheduler run that issued them.
/// A response is applied only while that epoch is still active, and the check
/// and the write happen under one lock, so nothing lands after a stop.
pub struct Syncer<R: Orchestrator + ?Sized> {
    remote: Arc<R>,
    store: Arc<SnapshotStore>,
    epochs: Mutex<Epochs>,
    state: Mutex<SyncState>,
}

impl<R: Orchestrator + ?Sized> Syncer<R> {
    /// Create a new syncer
    pub fn new(remote: Arc<R>, store: Arc<SnapshotStore>) -> Self {
        Self {
            remote,
            store,
            epochs: Mutex::new(Epochs::default()),
            state: Mutex::new(SyncState::default()),
        }
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Open a new poll lifecycle; responses for older epochs are dropped
    pub fn begin_epoch(&self) -> u64 {
        let mut epochs = lock(&self.epochs);
        epochs.next += 1;
        epochs.active = Some(epochs.next);
        epochs.next
    }

    /// Close the current poll lifecycle
    pub fn end_epoch(&self) {
        lock(&self.epochs).active = None;
    }

    /// Refresh on behalf of the scheduler run `epoch`
    pub async fn refresh(&self, epoch: u64) -> Result<RefreshOutcome, ConsoleError> {
        self.refresh_impl(Some(epoch)).await
    }

    /// One-off refresh outside any scheduler run
    pub async fn sync_once(&self) -> Result<RefreshOutcome, ConsoleError> {
        self.refresh_impl(None).await
    }

    async fn refresh_impl(&self, epoch: Option<u64>) -> Result<RefreshOutcome, ConsoleError> {
        lock(&self.state).last_attempted_sync_at = Some(Utc::now());

        debug!("Fetching deployment snapshot...");
        let result = self.remote.list_deployments().await;

        let epochs = lock(&self.epochs);
        if epoch.is_some() && epochs.active != epoch {
            debug!("Discarding snapshot for stale poll epoch {:?}", epoch);
            return Ok(RefreshOutcome::Discarded);
        }

        let mut state = lock(&self.state);
        match result {
            Ok(deployments) => {
                let count = deployments.len();
                self.store.replace(deployments);
                self.store.set_loading(false);
                state.last_synced_at = Some(Utc::now());
                state.err_streak = 0;
                state.last_error = None;
                info!("Snapshot refreshed: {} deployments", count);
                Ok(RefreshOutcome::Applied)
            }
            Err(e) => {
                // The previous snapshot stays visible
                self.store.set_loading(false);
                state.err_streak += 1;
                state.last_error = Some(e.to_string());
                error!("Snapshot refresh failed (attempt {}): {}", state.err_streak, e);
                Err(e)
            }
        }
    }

    /// Get sync state
    pub fn get_state(&self) -> SyncState {
        lock(&self.state).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
