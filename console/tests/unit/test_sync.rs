//! Snapshot polling tests

use std::sync::Arc;
use std::time::Duration;

use fleetconsole::sync::scheduler::{PollScheduler, RefreshTrigger};
use fleetconsole::sync::store::SnapshotStore;
use fleetconsole::sync::syncer::{RefreshOutcome, Syncer};
use fleetconsole::workers::poller;
use tokio::sync::Semaphore;

use crate::fakes::{deployment, eventually, remote_error, FakeOrchestrator, TICK};

fn scheduler(remote: Arc<FakeOrchestrator>) -> PollScheduler<FakeOrchestrator> {
    let store = Arc::new(SnapshotStore::new());
    let syncer = Arc::new(Syncer::new(remote, store));
    PollScheduler::new(syncer, poller::Options { interval: TICK })
}

fn ids(scheduler: &PollScheduler<FakeOrchestrator>) -> Vec<String> {
    scheduler
        .syncer()
        .store()
        .snapshot()
        .deployments
        .iter()
        .map(|d| d.id.clone())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_start_polls_immediately_then_on_interval() {
    let remote = Arc::new(FakeOrchestrator::with(vec![deployment("a", "running")]));
    let scheduler = scheduler(remote.clone());

    assert!(scheduler.start());
    assert!(!scheduler.start());
    assert!(scheduler.syncer().store().snapshot().loading);

    eventually(|| remote.list_calls() == 1).await;
    eventually(|| !scheduler.syncer().store().snapshot().loading).await;
    assert_eq!(ids(&scheduler), vec!["a"]);

    tokio::time::sleep(TICK + Duration::from_millis(1)).await;
    eventually(|| remote.list_calls() == 2).await;

    scheduler.stop();
    assert!(!scheduler.is_running());
    tokio::time::sleep(TICK * 4).await;
    assert_eq!(remote.list_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failed_poll_keeps_previous_snapshot() {
    let remote = Arc::new(FakeOrchestrator::default());
    remote.script(Ok(vec![deployment("a", "running")]));
    remote.script(Err(remote_error()));
    remote.script(Ok(vec![deployment("b", "running")]));
    let scheduler = scheduler(remote.clone());

    scheduler.start();
    eventually(|| remote.list_calls() == 1).await;
    eventually(|| scheduler.syncer().get_state().last_synced_at.is_some()).await;
    assert_eq!(ids(&scheduler), vec!["a"]);
    let revision = scheduler.syncer().store().snapshot().revision;

    tokio::time::sleep(TICK + Duration::from_millis(1)).await;
    eventually(|| scheduler.syncer().get_state().err_streak == 1).await;
    assert_eq!(ids(&scheduler), vec!["a"]);
    assert_eq!(scheduler.syncer().store().snapshot().revision, revision);
    assert!(scheduler.is_running());

    tokio::time::sleep(TICK).await;
    eventually(|| scheduler.syncer().get_state().err_streak == 0).await;
    assert_eq!(ids(&scheduler), vec!["b"]);
    assert!(scheduler.syncer().get_state().last_error.is_none());

    scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn test_refresh_requests_collapse() {
    let remote = Arc::new(FakeOrchestrator::default());
    let scheduler = scheduler(remote.clone());

    assert!(!scheduler.refresh_now());

    scheduler.start();
    eventually(|| remote.list_calls() == 1).await;

    // Three requests before the poller gets to run
    assert!(scheduler.refresh_now());
    assert!(scheduler.refresh_now());
    assert!(scheduler.refresh_now());

    eventually(|| remote.list_calls() == 2).await;
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
    assert_eq!(remote.list_calls(), 2);

    scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn test_refresh_does_not_shift_the_interval() {
    let remote = Arc::new(FakeOrchestrator::default());
    let scheduler = scheduler(remote.clone());

    scheduler.start();
    eventually(|| remote.list_calls() == 1).await;

    tokio::time::sleep(TICK / 2).await;
    assert!(scheduler.refresh_now());
    eventually(|| remote.list_calls() == 2).await;

    // Still due at TICK from the first poll, not TICK from the refresh
    tokio::time::sleep(TICK / 2 - Duration::from_millis(1)).await;
    assert_eq!(remote.list_calls(), 2);
    tokio::time::sleep(Duration::from_millis(2)).await;
    eventually(|| remote.list_calls() == 3).await;

    scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn test_failed_first_poll_clears_loading() {
    let remote = Arc::new(FakeOrchestrator::default());
    remote.script(Err(remote_error()));
    let scheduler = scheduler(remote.clone());

    scheduler.start();
    assert!(scheduler.syncer().store().snapshot().loading);

    eventually(|| scheduler.syncer().get_state().err_streak == 1).await;
    let snapshot = scheduler.syncer().store().snapshot();
    assert!(!snapshot.loading);
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.revision, 0);
    assert!(scheduler.syncer().get_state().last_error.is_some());
    assert!(scheduler.is_running());

    scheduler.stop();
}

#[tokio::test]
async fn test_stop_during_fetch_applies_nothing() {
    let gate = Arc::new(Semaphore::new(0));
    let remote = Arc::new(FakeOrchestrator::gated(
        vec![deployment("a", "running")],
        gate.clone(),
    ));
    let scheduler = scheduler(remote.clone());

    scheduler.start();
    eventually(|| remote.list_calls() == 1).await;

    scheduler.stop();
    gate.add_permits(1);
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }

    assert!(!scheduler.is_running());
    assert_eq!(remote.list_calls(), 1);
    let snapshot = scheduler.syncer().store().snapshot();
    assert_eq!(snapshot.revision, 0);
    assert!(snapshot.is_empty());
    assert!(scheduler.syncer().get_state().last_synced_at.is_none());
}

#[tokio::test]
async fn test_response_after_epoch_end_is_discarded() {
    let gate = Arc::new(Semaphore::new(0));
    let remote = Arc::new(FakeOrchestrator::gated(
        vec![deployment("a", "running")],
        gate.clone(),
    ));
    let store = Arc::new(SnapshotStore::new());
    let syncer = Arc::new(Syncer::new(remote.clone(), store.clone()));

    let epoch = syncer.begin_epoch();
    let in_flight = tokio::spawn({
        let syncer = syncer.clone();
        async move { syncer.refresh(epoch).await }
    });
    eventually(|| remote.list_calls() == 1).await;

    syncer.end_epoch();
    gate.add_permits(1);

    let outcome = in_flight.await.unwrap().unwrap();
    assert_eq!(outcome, RefreshOutcome::Discarded);
    assert_eq!(store.snapshot().revision, 0);
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn test_restart_invalidates_previous_epoch() {
    let gate = Arc::new(Semaphore::new(0));
    let remote = Arc::new(FakeOrchestrator::gated(vec![], gate.clone()));
    let store = Arc::new(SnapshotStore::new());
    let syncer = Arc::new(Syncer::new(remote.clone(), store.clone()));

    let old = syncer.begin_epoch();
    let stale = tokio::spawn({
        let syncer = syncer.clone();
        async move { syncer.refresh(old).await }
    });
    eventually(|| remote.list_calls() == 1).await;

    let current = syncer.begin_epoch();
    assert_ne!(old, current);
    gate.add_permits(2);

    assert_eq!(stale.await.unwrap().unwrap(), RefreshOutcome::Discarded);
    assert_eq!(syncer.refresh(current).await.unwrap(), RefreshOutcome::Applied);
    assert_eq!(store.snapshot().revision, 1);
}

#[tokio::test]
async fn test_sync_once_applies_without_scheduler() {
    let remote = Arc::new(FakeOrchestrator::with(vec![
        deployment("a", "running"),
        deployment("b", "terminated"),
    ]));
    let store = Arc::new(SnapshotStore::new());
    let syncer = Syncer::new(remote, store.clone());

    assert_eq!(syncer.sync_once().await.unwrap(), RefreshOutcome::Applied);
    assert_eq!(store.snapshot().deployments.len(), 2);
    assert_eq!(store.snapshot().terminated_count(), 1);
}
