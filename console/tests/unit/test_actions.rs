//! Action dispatch and row policy tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use fleetconsole::actions::{ActionDispatcher, LaunchForm};
use fleetconsole::app::commands;
use fleetconsole::app::options::AppOptions;
use fleetconsole::app::state::AppState;
use fleetconsole::config::args::CliArgs;
use fleetconsole::errors::ConsoleError;
use fleetconsole::sync::scheduler::RefreshTrigger;
use fleetconsole::ui::clipboard::Clipboard;
use fleetconsole::ui::prompt::{AssumeYes, Confirm};
use fleetconsole::ui::row::{copy_export, RowActions, RowOutcome};
use fleetconsole::workers::poller;
use tokio_test::{assert_err, assert_ok};

use crate::fakes::{deployment, eventually, FakeOrchestrator, FakeTransport, TICK};

#[derive(Default)]
struct CountingTrigger {
    count: AtomicUsize,
}

impl CountingTrigger {
    fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl RefreshTrigger for CountingTrigger {
    fn refresh_now(&self) -> bool {
        self.count.fetch_add(1, Ordering::SeqCst);
        true
    }
}

struct Decline;

#[async_trait]
impl Confirm for Decline {
    async fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

#[derive(Default)]
struct MemoryClipboard {
    text: std::sync::Mutex<Option<String>>,
}

impl Clipboard for MemoryClipboard {
    fn copy(&self, text: &str) -> Result<(), ConsoleError> {
        *self.text.lock().unwrap() = Some(text.to_string());
        Ok(())
    }
}

fn dispatcher(
    remote: Arc<FakeOrchestrator>,
) -> (ActionDispatcher<FakeOrchestrator>, Arc<CountingTrigger>) {
    let trigger = Arc::new(CountingTrigger::default());
    (ActionDispatcher::new(remote, trigger.clone()), trigger)
}

fn app_state(remote: Arc<FakeOrchestrator>) -> AppState {
    let options = AppOptions {
        poller: poller::Options { interval: TICK },
        ..Default::default()
    };
    AppState::with_remote(remote, Arc::new(FakeTransport::default()), &options)
}

#[tokio::test]
async fn test_launch_clears_name_and_refreshes() {
    let remote = Arc::new(FakeOrchestrator::default());
    let (dispatcher, trigger) = dispatcher(remote.clone());

    let mut form = LaunchForm {
        count: 4,
        key_name: "ops".to_string(),
        name: "analytics".to_string(),
    };
    let id = dispatcher.launch(&mut form).await.unwrap();

    assert_eq!(id, "dep-1");
    assert_eq!(form.name, "");
    assert_eq!(form.count, 4);
    assert_eq!(trigger.count(), 1);
    assert_eq!(remote.calls(), vec!["launch 4 ops"]);
}

#[tokio::test]
async fn test_invalid_launch_never_reaches_remote() {
    let remote = Arc::new(FakeOrchestrator::default());
    let (dispatcher, trigger) = dispatcher(remote.clone());

    let mut form = LaunchForm {
        count: 21,
        key_name: "ops".to_string(),
        name: "kept".to_string(),
    };
    let err = dispatcher.launch(&mut form).await.unwrap_err();

    assert!(matches!(err, ConsoleError::ValidationError(_)));
    assert_eq!(form.name, "kept");
    assert!(remote.calls().is_empty());
    assert_eq!(trigger.count(), 0);
}

#[tokio::test]
async fn test_failed_action_does_not_refresh() {
    let remote = Arc::new(FakeOrchestrator {
        fail_actions: true,
        ..Default::default()
    });
    let (dispatcher, trigger) = dispatcher(remote.clone());

    let mut form = LaunchForm {
        key_name: "ops".to_string(),
        name: "kept".to_string(),
        ..Default::default()
    };
    assert_err!(dispatcher.launch(&mut form).await);
    assert_eq!(form.name, "kept");

    let err = dispatcher.delete("dep-1").await.unwrap_err();
    assert_eq!(err.remote_status(), Some(503));
    assert_eq!(trigger.count(), 0);
}

#[tokio::test]
async fn test_only_state_changing_actions_refresh() {
    let remote = Arc::new(FakeOrchestrator::default());
    let (dispatcher, trigger) = dispatcher(remote.clone());

    assert_ok!(dispatcher.connect("dep-1").await);
    assert_ok!(dispatcher.open_logs("dep-1").await);
    assert_eq!(trigger.count(), 0);

    assert_ok!(dispatcher.restart("dep-1").await);
    assert_ok!(dispatcher.delete("dep-1").await);
    assert_ok!(dispatcher.clear_terminated().await);
    assert_eq!(trigger.count(), 3);
}

#[tokio::test]
async fn test_row_policy_gates_actions() {
    let remote = Arc::new(FakeOrchestrator::default());
    let (dispatcher, _trigger) = dispatcher(remote.clone());
    let rows = RowActions::new(&dispatcher, &AssumeYes);

    let pending = deployment("p", "setting_up");
    let terminated = deployment("t", "terminated");
    let running = deployment("r", "running");

    assert!(matches!(rows.connect(&pending).await.unwrap(), RowOutcome::NotAllowed(_)));
    assert!(matches!(rows.restart(&pending).await.unwrap(), RowOutcome::NotAllowed(_)));
    assert!(matches!(rows.delete(&terminated).await.unwrap(), RowOutcome::NotAllowed(_)));
    assert!(remote.calls().is_empty());

    assert_eq!(rows.delete(&pending).await.unwrap(), RowOutcome::Done);
    assert_eq!(rows.restart(&running).await.unwrap(), RowOutcome::Done);
    assert_eq!(rows.connect(&running).await.unwrap(), RowOutcome::Done);
    assert_eq!(remote.calls(), vec!["delete p", "restart r", "connect r"]);
}

#[tokio::test]
async fn test_declined_confirmation_sends_nothing() {
    let remote = Arc::new(FakeOrchestrator::default());
    let (dispatcher, trigger) = dispatcher(remote.clone());
    let rows = RowActions::new(&dispatcher, &Decline);

    let running = deployment("r", "running");
    assert_eq!(rows.delete(&running).await.unwrap(), RowOutcome::Declined);
    assert_eq!(rows.restart(&running).await.unwrap(), RowOutcome::Declined);
    assert!(remote.calls().is_empty());
    assert_eq!(trigger.count(), 0);
}

#[test]
fn test_copy_export_needs_head_ip() {
    let clipboard = MemoryClipboard::default();

    let pending = deployment("p", "launching");
    assert!(matches!(
        copy_export(&pending, &clipboard).unwrap(),
        RowOutcome::NotAllowed(_)
    ));
    assert!(clipboard.text.lock().unwrap().is_none());

    let running = deployment("r", "running");
    assert_eq!(copy_export(&running, &clipboard).unwrap(), RowOutcome::Done);
    assert_eq!(
        clipboard.text.lock().unwrap().as_deref(),
        Some("export SCALABLE_DOCKER_SERVER_URL=http://10.0.0.5:8080")
    );
}

#[tokio::test]
async fn test_clear_terminated_skipped_when_none() {
    let remote = Arc::new(FakeOrchestrator::with(vec![deployment("r", "running")]));
    let state = app_state(remote.clone());

    let outcome = commands::clear_terminated(&state, &AssumeYes).await.unwrap();
    assert!(matches!(outcome, RowOutcome::NotAllowed(_)));
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn test_clear_terminated_removes_rows() {
    let remote = Arc::new(FakeOrchestrator::with(vec![
        deployment("r", "running"),
        deployment("t", "terminated"),
    ]));
    let state = app_state(remote.clone());

    let outcome = commands::clear_terminated(&state, &AssumeYes).await.unwrap();
    assert_eq!(outcome, RowOutcome::Done);
    assert_eq!(remote.calls(), vec!["clear_terminated"]);

    state.syncer.sync_once().await.unwrap();
    assert_eq!(state.store.snapshot().terminated_count(), 0);
}

#[tokio::test]
async fn test_unknown_deployment_is_not_found() {
    let remote = Arc::new(FakeOrchestrator::default());
    let state = app_state(remote.clone());

    let err = commands::restart(&state, "ghost", &AssumeYes).await.unwrap_err();
    assert!(matches!(err, ConsoleError::NotFound(_)));
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn test_launch_command_uses_default_key() {
    let remote = Arc::new(FakeOrchestrator::default());
    let state = app_state(remote.clone());

    let args = CliArgs::parse(["--launch", "--count=3"]);
    let id = commands::launch(&state, &args).await.unwrap();
    assert_eq!(id, "dep-1");
    assert_eq!(remote.calls(), vec!["launch 3 ci"]);

    let keys = commands::keys(&state).await.unwrap();
    assert_eq!(keys, "  ops  aa:bb\n* ci\n");
}

#[tokio::test(start_paused = true)]
async fn test_launch_while_watching_shows_up_in_snapshot() {
    let remote = Arc::new(FakeOrchestrator::default());
    let state = app_state(remote.clone());

    state.scheduler.start();
    eventually(|| remote.list_calls() == 1).await;
    assert!(state.store.snapshot().is_empty());

    let mut form = LaunchForm {
        count: 4,
        key_name: "k1".to_string(),
        name: "c1".to_string(),
    };
    let id = state.dispatcher.launch(&mut form).await.unwrap();

    // The refresh lands before the next tick
    eventually(|| state.store.snapshot().get(&id).is_some()).await;
    assert_eq!(remote.list_calls(), 2);

    let snapshot = state.store.snapshot();
    let launched = snapshot.get(&id).unwrap();
    assert_eq!(launched.name, "c1");
    assert_eq!(launched.worker_count, 3);
    assert_eq!(launched.status.as_str(), "launching");

    state.shutdown().await;
    assert!(!state.scheduler.is_running());
}
