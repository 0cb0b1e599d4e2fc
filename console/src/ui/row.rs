//! Per-row actions with confirmation and status gating

use tracing::info;

use crate::actions::ActionDispatcher;
use crate::errors::ConsoleError;
use crate::models::deployment::Deployment;
use crate::remote::Orchestrator;
use crate::sync::store::Snapshot;
use crate::ui::clipboard::Clipboard;
use crate::ui::prompt::Confirm;

/// Result of a gated action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Done,
    Declined,
    NotAllowed(String),
}

/// Wraps the dispatcher with the console's row policy: connect and restart
/// need a running deployment, delete a non-terminated one, and delete and
/// restart ask first.
pub struct RowActions<'a, R: Orchestrator + ?Sized> {
    dispatcher: &'a ActionDispatcher<R>,
    confirm: &'a dyn Confirm,
}

impl<'a, R: Orchestrator + ?Sized> RowActions<'a, R> {
    pub fn new(dispatcher: &'a ActionDispatcher<R>, confirm: &'a dyn Confirm) -> Self {
        Self {
            dispatcher,
            confirm,
        }
    }

    pub async fn delete(&self, deployment: &Deployment) -> Result<RowOutcome, ConsoleError> {
        if !deployment.can_delete() {
            return Ok(not_allowed("delete", deployment));
        }
        if !self
            .confirm
            .confirm(&format!("Delete deployment {}?", deployment.name))
            .await
        {
            return Ok(RowOutcome::Declined);
        }
        self.dispatcher.delete(&deployment.id).await?;
        Ok(RowOutcome::Done)
    }

    pub async fn restart(&self, deployment: &Deployment) -> Result<RowOutcome, ConsoleError> {
        if !deployment.can_restart() {
            return Ok(not_allowed("restart", deployment));
        }
        if !self
            .confirm
            .confirm(&format!("Restart deployment {}?", deployment.name))
            .await
        {
            return Ok(RowOutcome::Declined);
        }
        self.dispatcher.restart(&deployment.id).await?;
        Ok(RowOutcome::Done)
    }

    pub async fn connect(&self, deployment: &Deployment) -> Result<RowOutcome, ConsoleError> {
        if !deployment.can_connect() {
            return Ok(not_allowed("connect to", deployment));
        }
        self.dispatcher.connect(&deployment.id).await?;
        Ok(RowOutcome::Done)
    }

    /// Skips the call when nothing is terminated
    pub async fn clear_terminated(&self, snapshot: &Snapshot) -> Result<RowOutcome, ConsoleError> {
        if snapshot.terminated_count() == 0 {
            return Ok(RowOutcome::NotAllowed(
                "no terminated deployments to clear".to_string(),
            ));
        }
        self.dispatcher.clear_terminated().await?;
        Ok(RowOutcome::Done)
    }
}

/// Copy the head-node export line for `deployment`
pub fn copy_export(
    deployment: &Deployment,
    clipboard: &dyn Clipboard,
) -> Result<RowOutcome, ConsoleError> {
    let Some(command) = deployment.export_command() else {
        return Ok(RowOutcome::NotAllowed(format!(
            "deployment {} has no head IP yet",
            deployment.name
        )));
    };
    clipboard.copy(&command)?;
    info!("Copied export command for {}", deployment.id);
    Ok(RowOutcome::Done)
}

fn not_allowed(action: &str, deployment: &Deployment) -> RowOutcome {
    RowOutcome::NotAllowed(format!(
        "cannot {} deployment {} while it is {}",
        action, deployment.name, deployment.status
    ))
}
