//! API models

use serde::{Deserialize, Serialize};

/// One row of `GET /deployments`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSummary {
    pub id: String,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub head_ip: Option<String>,
    #[serde(default)]
    pub worker_count: u32,
    pub created_at: String,
}

/// Full snapshot response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentListResponse {
    pub deployments: Vec<DeploymentSummary>,
}

/// Launch request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchRequest {
    pub count: u32,
    pub key_name: String,
    pub name: Option<String>,
}

/// Launch acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchResponse {
    pub deployment_id: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// SSH key pair known to the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPair {
    pub name: String,
    #[serde(default)]
    pub fingerprint: Option<String>,
}

/// Key listing response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeysResponse {
    pub keys: Vec<KeyPair>,
    #[serde(default)]
    pub default: Option<String>,
}

/// Generic acknowledgement for mutating endpoints. Bodies vary per endpoint,
/// so every field is optional and unknown fields are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Error body returned alongside non-2xx statuses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// One event of `GET /deployments/{id}/logs/stream`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamMessage {
    /// A single log line
    Log { message: String },

    /// The remote finished streaming; carries the deployment's final status
    Complete {
        #[serde(default)]
        status: Option<String>,
    },

    /// Any type this client does not understand
    #[serde(other)]
    Unknown,
}
