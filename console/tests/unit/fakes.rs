//! In-memory orchestrator and log transport

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use fleetconsole::errors::ConsoleError;
use fleetconsole::models::deployment::{Deployment, DeploymentStatus};
use fleetconsole::remote::{LogSubscription, LogTransport, Orchestrator};
use futures::StreamExt;
use openapi_client::models::{KeyPair, KeysResponse, LaunchRequest, StreamMessage};
use tokio::sync::{mpsc, Semaphore};

pub fn deployment(id: &str, status: &str) -> Deployment {
    Deployment {
        id: id.to_string(),
        name: format!("cluster-{}", id),
        status: DeploymentStatus::new(status),
        head_ip: (status == DeploymentStatus::RUNNING).then(|| "10.0.0.5".to_string()),
        worker_count: 3,
        created_at: Some(Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()),
    }
}

pub fn remote_error() -> ConsoleError {
    ConsoleError::Remote {
        status: 503,
        message: "orchestrator unavailable".to_string(),
    }
}

/// Scripted orchestrator.
///
/// `list_deployments` pops a scripted result if one is queued and otherwise
/// returns the current deployment list. When `gate` is set every list call
/// waits for a permit.
#[derive(Default)]
pub struct FakeOrchestrator {
    pub deployments: Mutex<Vec<Deployment>>,
    pub scripted: Mutex<VecDeque<Result<Vec<Deployment>, ConsoleError>>>,
    pub calls: Mutex<Vec<String>>,
    pub list_calls: AtomicUsize,
    pub gate: Option<Arc<Semaphore>>,
    pub fail_actions: bool,
}

impl FakeOrchestrator {
    pub fn with(deployments: Vec<Deployment>) -> Self {
        Self {
            deployments: Mutex::new(deployments),
            ..Default::default()
        }
    }

    pub fn gated(deployments: Vec<Deployment>, gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::with(deployments)
        }
    }

    pub fn script(&self, result: Result<Vec<Deployment>, ConsoleError>) {
        self.scripted.lock().unwrap().push_back(result);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), ConsoleError> {
        self.calls.lock().unwrap().push(call);
        if self.fail_actions {
            return Err(remote_error());
        }
        Ok(())
    }
}

#[async_trait]
impl Orchestrator for FakeOrchestrator {
    async fn list_deployments(&self) -> Result<Vec<Deployment>, ConsoleError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if let Some(result) = self.scripted.lock().unwrap().pop_front() {
            return result;
        }
        Ok(self.deployments.lock().unwrap().clone())
    }

    async fn launch(&self, request: &LaunchRequest) -> Result<String, ConsoleError> {
        self.record(format!("launch {} {}", request.count, request.key_name))?;
        let mut deployments = self.deployments.lock().unwrap();
        let id = format!("dep-{}", deployments.len() + 1);
        // One head node, the rest workers
        deployments.push(Deployment {
            name: request
                .name
                .clone()
                .unwrap_or_else(|| format!("cluster-{}-nodes", request.count)),
            worker_count: request.count - 1,
            ..deployment(&id, "launching")
        });
        Ok(id)
    }

    async fn delete_deployment(&self, deployment_id: &str) -> Result<(), ConsoleError> {
        self.record(format!("delete {}", deployment_id))
    }

    async fn restart_deployment(&self, deployment_id: &str) -> Result<(), ConsoleError> {
        self.record(format!("restart {}", deployment_id))
    }

    async fn connect(&self, deployment_id: &str) -> Result<(), ConsoleError> {
        self.record(format!("connect {}", deployment_id))
    }

    async fn open_logs(&self, deployment_id: &str) -> Result<(), ConsoleError> {
        self.record(format!("open_logs {}", deployment_id))
    }

    async fn clear_terminated(&self) -> Result<(), ConsoleError> {
        self.record("clear_terminated".to_string())?;
        self.deployments
            .lock()
            .unwrap()
            .retain(|d| !d.status.is_terminated());
        Ok(())
    }

    async fn list_keys(&self) -> Result<KeysResponse, ConsoleError> {
        Ok(KeysResponse {
            keys: vec![
                KeyPair {
                    name: "ops".to_string(),
                    fingerprint: Some("aa:bb".to_string()),
                },
                KeyPair {
                    name: "ci".to_string(),
                    fingerprint: None,
                },
            ],
            default: Some("ci".to_string()),
        })
    }
}

/// Log transport fed through per-deployment channels
#[derive(Default)]
pub struct FakeTransport {
    senders: Mutex<HashMap<String, mpsc::UnboundedSender<Result<StreamMessage, ConsoleError>>>>,
}

impl FakeTransport {
    /// Push a message into the latest subscription for `deployment_id`
    pub fn send(&self, deployment_id: &str, message: StreamMessage) -> bool {
        self.senders
            .lock()
            .unwrap()
            .get(deployment_id)
            .map(|tx| tx.send(Ok(message)).is_ok())
            .unwrap_or(false)
    }

    /// End the latest subscription without a completion event
    pub fn hang_up(&self, deployment_id: &str) {
        self.senders.lock().unwrap().remove(deployment_id);
    }

    pub fn is_subscribed(&self, deployment_id: &str) -> bool {
        self.senders
            .lock()
            .unwrap()
            .get(deployment_id)
            .is_some_and(|tx| !tx.is_closed())
    }
}

#[async_trait]
impl LogTransport for FakeTransport {
    async fn subscribe(&self, deployment_id: &str) -> Result<LogSubscription, ConsoleError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders
            .lock()
            .unwrap()
            .insert(deployment_id.to_string(), tx);
        Ok(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })
        .boxed())
    }
}

/// Yield until `condition` holds, without advancing time
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

pub const TICK: Duration = Duration::from_secs(5);
