//! Application state management

use std::sync::Arc;

use tracing::info;

use crate::actions::ActionDispatcher;
use crate::app::options::AppOptions;
use crate::errors::ConsoleError;
use crate::http::client::HttpClient;
use crate::http::log_stream::SseLogTransport;
use crate::remote::{LogTransport, Orchestrator};
use crate::streams::LogMultiplexer;
use crate::sync::scheduler::PollScheduler;
use crate::sync::store::SnapshotStore;
use crate::sync::syncer::Syncer;

/// Main application state
pub struct AppState {
    /// Orchestrator API
    pub remote: Arc<dyn Orchestrator>,

    /// Latest deployment snapshot
    pub store: Arc<SnapshotStore>,

    /// Snapshot syncer
    pub syncer: Arc<Syncer<dyn Orchestrator>>,

    /// Periodic poll lifecycle
    pub scheduler: Arc<PollScheduler<dyn Orchestrator>>,

    /// Mutating actions
    pub dispatcher: Arc<ActionDispatcher<dyn Orchestrator>>,

    /// Per-deployment log sessions
    pub logs: Arc<LogMultiplexer<dyn LogTransport>>,
}

impl AppState {
    /// Initialize application state against the HTTP orchestrator
    pub fn init(options: &AppOptions) -> Result<Self, ConsoleError> {
        info!("Initializing application state...");

        let http_client = Arc::new(HttpClient::new(
            &options.backend_base_url,
            options.request_timeout,
        )?);
        let transport = Arc::new(SseLogTransport::new(&http_client)?);

        Ok(Self::with_remote(http_client, transport, options))
    }

    /// Wire the state around any orchestrator and log transport
    pub fn with_remote(
        remote: Arc<dyn Orchestrator>,
        transport: Arc<dyn LogTransport>,
        options: &AppOptions,
    ) -> Self {
        let store = Arc::new(SnapshotStore::new());
        let syncer = Arc::new(Syncer::new(remote.clone(), store.clone()));
        let scheduler = Arc::new(PollScheduler::new(syncer.clone(), options.poller.clone()));
        let dispatcher = Arc::new(ActionDispatcher::new(remote.clone(), scheduler.clone()));
        let logs = Arc::new(LogMultiplexer::new(transport, options.streams.clone()));

        Self {
            remote,
            store,
            syncer,
            scheduler,
            dispatcher,
            logs,
        }
    }

    /// Stop polling and release every log subscription
    pub async fn shutdown(&self) {
        info!("Shutting down application state...");
        self.scheduler.stop();
        self.logs.shutdown().await;
    }
}
