//! Seams between the console core and the remote orchestrator
//!
//! The core only talks to the orchestrator through these traits, so pollers,
//! dispatchers and log sessions can be driven by in-memory fakes.

use async_trait::async_trait;
use futures::stream::BoxStream;
use openapi_client::models::{KeysResponse, LaunchRequest, StreamMessage};

use crate::errors::ConsoleError;
use crate::models::deployment::Deployment;

/// Request/response endpoints of the orchestrator
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Full deployment snapshot
    async fn list_deployments(&self) -> Result<Vec<Deployment>, ConsoleError>;

    /// Launch a deployment; returns the new deployment ID
    async fn launch(&self, request: &LaunchRequest) -> Result<String, ConsoleError>;

    async fn delete_deployment(&self, deployment_id: &str) -> Result<(), ConsoleError>;

    async fn restart_deployment(&self, deployment_id: &str) -> Result<(), ConsoleError>;

    /// Ask the orchestrator to open an operator session on the head node
    async fn connect(&self, deployment_id: &str) -> Result<(), ConsoleError>;

    /// Ask the orchestrator to open the deployment's log file locally
    async fn open_logs(&self, deployment_id: &str) -> Result<(), ConsoleError>;

    /// Remove every terminated deployment
    async fn clear_terminated(&self) -> Result<(), ConsoleError>;

    async fn list_keys(&self) -> Result<KeysResponse, ConsoleError>;
}

/// A live log subscription.
///
/// `Ok` items are messages, an `Err` item is a transport failure after which
/// nothing more is delivered, and dropping the stream closes it.
pub type LogSubscription = BoxStream<'static, Result<StreamMessage, ConsoleError>>;

/// Opens log subscriptions
#[async_trait]
pub trait LogTransport: Send + Sync {
    async fn subscribe(&self, deployment_id: &str) -> Result<LogSubscription, ConsoleError>;
}
