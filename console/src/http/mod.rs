//! Orchestrator HTTP transport

pub mod client;
pub mod deployments;
pub mod keys;
pub mod log_stream;
pub mod sse;

use async_trait::async_trait;
use openapi_client::models::{KeysResponse, LaunchRequest};

use crate::errors::ConsoleError;
use crate::http::client::HttpClient;
use crate::models::deployment::Deployment;
use crate::remote::Orchestrator;

#[async_trait]
impl Orchestrator for HttpClient {
    async fn list_deployments(&self) -> Result<Vec<Deployment>, ConsoleError> {
        self.get_deployments().await
    }

    async fn launch(&self, request: &LaunchRequest) -> Result<String, ConsoleError> {
        self.launch_deployment(request).await
    }

    async fn delete_deployment(&self, deployment_id: &str) -> Result<(), ConsoleError> {
        HttpClient::delete_deployment(self, deployment_id).await
    }

    async fn restart_deployment(&self, deployment_id: &str) -> Result<(), ConsoleError> {
        HttpClient::restart_deployment(self, deployment_id).await
    }

    async fn connect(&self, deployment_id: &str) -> Result<(), ConsoleError> {
        self.connect_to_head(deployment_id).await
    }

    async fn open_logs(&self, deployment_id: &str) -> Result<(), ConsoleError> {
        self.open_log_file(deployment_id).await
    }

    async fn clear_terminated(&self) -> Result<(), ConsoleError> {
        self.clear_terminated_deployments().await
    }

    async fn list_keys(&self) -> Result<KeysResponse, ConsoleError> {
        self.get_keys().await
    }
}
