//! Deployment snapshot store

use std::sync::Arc;

use tokio::sync::watch;

use crate::models::deployment::Deployment;

/// The set of known deployments at one point in time
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Deployments from a single poll response
    pub deployments: Arc<Vec<Deployment>>,

    /// True until the first poll of a running scheduler settles
    pub loading: bool,

    /// Number of replacements applied so far
    pub revision: u64,
}

impl Snapshot {
    pub fn get(&self, deployment_id: &str) -> Option<&Deployment> {
        self.deployments.iter().find(|d| d.id == deployment_id)
    }

    pub fn terminated_count(&self) -> usize {
        self.deployments
            .iter()
            .filter(|d| d.status.is_terminated())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.deployments.is_empty()
    }
}

/// Holds the last-known snapshot.
///
/// Writes replace the whole collection, so a reader never sees a row mixing
/// two poll responses. Only the poll path writes; everything else reads via
/// [`SnapshotStore::snapshot`] or a [`watch::Receiver`].
#[derive(Debug)]
pub struct SnapshotStore {
    tx: watch::Sender<Snapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Snapshot::default());
        Self { tx }
    }

    /// Swap in a new deployment list
    pub fn replace(&self, deployments: Vec<Deployment>) {
        let deployments = Arc::new(deployments);
        self.tx.send_modify(|snapshot| {
            snapshot.deployments = deployments;
            snapshot.revision += 1;
        });
    }

    pub fn set_loading(&self, loading: bool) {
        self.tx.send_if_modified(|snapshot| {
            if snapshot.loading == loading {
                return false;
            }
            snapshot.loading = loading;
            true
        });
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    /// Watch for replacements and loading changes
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
