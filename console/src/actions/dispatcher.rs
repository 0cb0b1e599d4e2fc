//! Action dispatcher

use std::sync::Arc;

use tracing::{error, info};

use crate::actions::launch::LaunchForm;
use crate::errors::ConsoleError;
use crate::remote::Orchestrator;
use crate::sync::scheduler::RefreshTrigger;

/// Turns operator intents into single orchestrator requests.
///
/// Nothing is retried. Mutations that change what the next snapshot looks
/// like request an out-of-band refresh on success; failures are returned to
/// the caller and leave the snapshot alone.
pub struct ActionDispatcher<R: Orchestrator + ?Sized> {
    remote: Arc<R>,
    refresher: Arc<dyn RefreshTrigger>,
}

impl<R: Orchestrator + ?Sized> ActionDispatcher<R> {
    pub fn new(remote: Arc<R>, refresher: Arc<dyn RefreshTrigger>) -> Self {
        Self { remote, refresher }
    }

    /// Launch from the form; clears the name input on success
    pub async fn launch(&self, form: &mut LaunchForm) -> Result<String, ConsoleError> {
        let request = form.validate()?;
        info!(
            "Launching {} instances with key {}",
            request.count, request.key_name
        );

        let deployment_id = self
            .remote
            .launch(&request)
            .await
            .inspect_err(|e| error!("Launch failed: {}", e))?;

        form.clear_name();
        self.refresher.refresh_now();
        Ok(deployment_id)
    }

    /// Terminate a deployment. Callers only offer this for non-terminated ones.
    pub async fn delete(&self, deployment_id: &str) -> Result<(), ConsoleError> {
        info!("Deleting deployment {}", deployment_id);
        self.remote
            .delete_deployment(deployment_id)
            .await
            .inspect_err(|e| error!("Delete of {} failed: {}", deployment_id, e))?;
        self.refresher.refresh_now();
        Ok(())
    }

    pub async fn restart(&self, deployment_id: &str) -> Result<(), ConsoleError> {
        info!("Restarting deployment {}", deployment_id);
        self.remote
            .restart_deployment(deployment_id)
            .await
            .inspect_err(|e| error!("Restart of {} failed: {}", deployment_id, e))?;
        self.refresher.refresh_now();
        Ok(())
    }

    /// Open an operator session on the head node. Deployment state is
    /// unchanged, so no refresh follows.
    pub async fn connect(&self, deployment_id: &str) -> Result<(), ConsoleError> {
        info!("Connecting to head of {}", deployment_id);
        self.remote
            .connect(deployment_id)
            .await
            .inspect_err(|e| error!("Connect to {} failed: {}", deployment_id, e))
    }

    /// Open the log file on the orchestrator host; no refresh follows
    pub async fn open_logs(&self, deployment_id: &str) -> Result<(), ConsoleError> {
        self.remote
            .open_logs(deployment_id)
            .await
            .inspect_err(|e| error!("Opening logs of {} failed: {}", deployment_id, e))
    }

    /// Remove all terminated deployments in one call
    pub async fn clear_terminated(&self) -> Result<(), ConsoleError> {
        info!("Clearing terminated deployments");
        self.remote
            .clear_terminated()
            .await
            .inspect_err(|e| error!("Clearing terminated deployments failed: {}", e))?;
        self.refresher.refresh_now();
        Ok(())
    }
}
