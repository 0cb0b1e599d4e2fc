//! One-shot console commands

use tracing::info;

use crate::actions::LaunchForm;
use crate::app::state::AppState;
use crate::config::args::CliArgs;
use crate::errors::ConsoleError;
use crate::models::deployment::Deployment;
use crate::ui::clipboard::Clipboard;
use crate::ui::prompt::{AssumeYes, Confirm};
use crate::ui::row::{copy_export, RowActions, RowOutcome};
use crate::ui::table;

/// Fetch once and render the table
pub async fn list(state: &AppState, color: bool) -> Result<String, ConsoleError> {
    state.syncer.sync_once().await?;
    Ok(table::render(&state.store.snapshot(), color))
}

/// Key pairs, the orchestrator's default marked with `*`
pub async fn keys(state: &AppState) -> Result<String, ConsoleError> {
    let keys = state.remote.list_keys().await?;
    if keys.keys.is_empty() {
        return Ok("No key pairs available\n".to_string());
    }

    let mut out = String::new();
    for key in &keys.keys {
        let marker = if keys.default.as_deref() == Some(key.name.as_str()) {
            "*"
        } else {
            " "
        };
        match &key.fingerprint {
            Some(fingerprint) => out.push_str(&format!("{} {}  {}\n", marker, key.name, fingerprint)),
            None => out.push_str(&format!("{} {}\n", marker, key.name)),
        }
    }
    Ok(out)
}

/// Launch from `--count`, `--key` and `--name`, falling back to the form
/// defaults. Returns the new deployment id.
pub async fn launch(state: &AppState, args: &CliArgs) -> Result<String, ConsoleError> {
    let keys = state.remote.list_keys().await?;
    let mut form = LaunchForm::from_keys(&keys);
    if let Some(count) = args.parsed::<u32>("count")? {
        form.count = count;
    }
    if let Some(key_name) = args.get("key") {
        form.key_name = key_name.to_string();
    }
    if let Some(name) = args.get("name") {
        form.name = name.to_string();
    }

    state.dispatcher.launch(&mut form).await
}

pub async fn delete(
    state: &AppState,
    deployment_id: &str,
    confirm: &dyn Confirm,
) -> Result<RowOutcome, ConsoleError> {
    let deployment = find_deployment(state, deployment_id).await?;
    RowActions::new(&*state.dispatcher, confirm)
        .delete(&deployment)
        .await
}

pub async fn restart(
    state: &AppState,
    deployment_id: &str,
    confirm: &dyn Confirm,
) -> Result<RowOutcome, ConsoleError> {
    let deployment = find_deployment(state, deployment_id).await?;
    RowActions::new(&*state.dispatcher, confirm)
        .restart(&deployment)
        .await
}

pub async fn connect(state: &AppState, deployment_id: &str) -> Result<RowOutcome, ConsoleError> {
    let deployment = find_deployment(state, deployment_id).await?;
    // Connecting is never confirmed
    RowActions::new(&*state.dispatcher, &AssumeYes)
        .connect(&deployment)
        .await
}

/// Ask the orchestrator to open the deployment's log file on its host
pub async fn open_logs(state: &AppState, deployment_id: &str) -> Result<RowOutcome, ConsoleError> {
    let deployment = find_deployment(state, deployment_id).await?;
    state.dispatcher.open_logs(&deployment.id).await?;
    Ok(RowOutcome::Done)
}

pub async fn clear_terminated(
    state: &AppState,
    confirm: &dyn Confirm,
) -> Result<RowOutcome, ConsoleError> {
    state.syncer.sync_once().await?;
    let snapshot = state.store.snapshot();
    RowActions::new(&*state.dispatcher, confirm)
        .clear_terminated(&snapshot)
        .await
}

pub async fn export(
    state: &AppState,
    deployment_id: &str,
    clipboard: &dyn Clipboard,
) -> Result<RowOutcome, ConsoleError> {
    let deployment = find_deployment(state, deployment_id).await?;
    copy_export(&deployment, clipboard)
}

/// Refresh and look up one deployment
async fn find_deployment(state: &AppState, deployment_id: &str) -> Result<Deployment, ConsoleError> {
    state.syncer.sync_once().await?;
    state
        .store
        .snapshot()
        .get(deployment_id)
        .cloned()
        .ok_or_else(|| {
            info!("Deployment {} not in the current snapshot", deployment_id);
            ConsoleError::NotFound(format!("deployment {}", deployment_id))
        })
}
