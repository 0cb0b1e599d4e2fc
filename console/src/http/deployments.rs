//! Deployment API client

use openapi_client::models::{DeploymentListResponse, LaunchRequest, LaunchResponse};
use reqwest::Method;
use tracing::info;

use crate::errors::ConsoleError;
use crate::http::client::HttpClient;
use crate::models::deployment::Deployment;

/// Path of a single deployment resource, with an optional suffix
pub fn deployment_path(deployment_id: &str, suffix: &str) -> Result<String, ConsoleError> {
    if deployment_id.is_empty() || deployment_id.contains(&['/', '?', '#'][..]) {
        return Err(ConsoleError::ValidationError(format!(
            "invalid deployment id: {:?}",
            deployment_id
        )));
    }
    Ok(format!("/deployments/{}{}", deployment_id, suffix))
}

impl HttpClient {
    /// Fetch the full deployment snapshot
    pub async fn get_deployments(&self) -> Result<Vec<Deployment>, ConsoleError> {
        let response: DeploymentListResponse = self.get("/deployments").await?;
        Ok(response
            .deployments
            .into_iter()
            .map(Deployment::from)
            .collect())
    }

    /// Launch a new deployment
    pub async fn launch_deployment(&self, request: &LaunchRequest) -> Result<String, ConsoleError> {
        let response: LaunchResponse = self.post("/launch", request).await?;
        info!(
            "Launch accepted: {} ({})",
            response.deployment_id,
            response.status.as_deref().unwrap_or("unknown")
        );
        Ok(response.deployment_id)
    }

    /// Terminate a deployment
    pub async fn delete_deployment(&self, deployment_id: &str) -> Result<(), ConsoleError> {
        let path = deployment_path(deployment_id, "")?;
        self.command(Method::DELETE, &path).await?;
        Ok(())
    }

    /// Restart the services of a deployment
    pub async fn restart_deployment(&self, deployment_id: &str) -> Result<(), ConsoleError> {
        let path = deployment_path(deployment_id, "/restart")?;
        self.command(Method::POST, &path).await?;
        Ok(())
    }

    /// Open an operator session on the head node
    pub async fn connect_to_head(&self, deployment_id: &str) -> Result<(), ConsoleError> {
        // Validates the id; the route itself lives outside /deployments
        deployment_path(deployment_id, "")?;
        self.command(Method::POST, &format!("/connect/{}", deployment_id))
            .await?;
        Ok(())
    }

    /// Open the deployment log file on the orchestrator host
    pub async fn open_log_file(&self, deployment_id: &str) -> Result<(), ConsoleError> {
        let path = deployment_path(deployment_id, "/logs/open")?;
        let ack = self.command(Method::GET, &path).await?;
        if let Some(log_file) = ack.extra.get("log_file").and_then(|v| v.as_str()) {
            info!("Opened log file {}", log_file);
        }
        Ok(())
    }

    /// Remove all terminated deployments
    pub async fn clear_terminated_deployments(&self) -> Result<(), ConsoleError> {
        self.command(Method::POST, "/deployments/clear-terminated")
            .await?;
        Ok(())
    }
}
