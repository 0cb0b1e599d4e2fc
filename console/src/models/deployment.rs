//! Deployment models

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use openapi_client::models::DeploymentSummary;
use serde::{Deserialize, Serialize};

/// Deployment status as reported by the orchestrator.
///
/// The vocabulary belongs to the remote side (`launching`, `waiting_for_ips`,
/// `setting_up`, `running`, `failed`, `terminating`, `terminated`, ...), so
/// the value is kept verbatim. Only `running` and `terminated` carry meaning
/// for the console.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeploymentStatus(String);

impl DeploymentStatus {
    pub const RUNNING: &'static str = "running";
    pub const TERMINATED: &'static str = "terminated";

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_running(&self) -> bool {
        self.0 == Self::RUNNING
    }

    /// `terminated` is absorbing: a deployment never leaves it
    pub fn is_terminated(&self) -> bool {
        self.0 == Self::TERMINATED
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A deployment (one head node plus workers) as last seen in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    /// Stable deployment ID
    pub id: String,

    /// Display name
    pub name: String,

    /// Remote status
    pub status: DeploymentStatus,

    /// Head node address, once known
    pub head_ip: Option<String>,

    /// Number of worker nodes
    pub worker_count: u32,

    /// Creation time, if the remote sent a parseable timestamp
    pub created_at: Option<DateTime<Utc>>,
}

impl Deployment {
    pub fn can_connect(&self) -> bool {
        self.status.is_running()
    }

    pub fn can_restart(&self) -> bool {
        self.status.is_running()
    }

    pub fn can_delete(&self) -> bool {
        !self.status.is_terminated()
    }

    /// Shell line pointing local tooling at this deployment's head server
    pub fn export_command(&self) -> Option<String> {
        self.head_ip
            .as_ref()
            .map(|ip| format!("export SCALABLE_DOCKER_SERVER_URL=http://{}:8080", ip))
    }
}

impl From<DeploymentSummary> for Deployment {
    fn from(summary: DeploymentSummary) -> Self {
        Self {
            created_at: parse_timestamp(&summary.created_at),
            id: summary.id,
            name: summary.name,
            status: DeploymentStatus::new(summary.status),
            head_ip: summary.head_ip.filter(|ip| !ip.is_empty()),
            worker_count: summary.worker_count,
        }
    }
}

/// Accepts RFC 3339 and zone-less ISO 8601 (read as UTC)
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
