//! Settings file management

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app::options::AppOptions;
use crate::config::args::CliArgs;
use crate::errors::ConsoleError;
use crate::logs::{LogLevel, LogOptions};
use crate::streams;
use crate::workers::poller;

pub const DEFAULT_SETTINGS_FILE: &str = "fleetconsole.json";

/// Console settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON log lines
    #[serde(default)]
    pub json_logs: bool,

    /// Directory for rolling log files
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Orchestrator configuration
    #[serde(default)]
    pub backend: BackendSettings,

    /// Polling interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Capacity of the log session update channel
    #[serde(default = "default_log_stream_buffer")]
    pub log_stream_buffer: usize,
}

fn default_poll_interval() -> u64 {
    5
}

fn default_log_stream_buffer() -> usize {
    256
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            json_logs: false,
            log_dir: None,
            backend: BackendSettings::default(),
            poll_interval_secs: default_poll_interval(),
            log_stream_buffer: default_log_stream_buffer(),
        }
    }
}

/// Orchestrator API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL for the orchestrator API
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://localhost:5001/api".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Settings {
    /// Read settings from `path`; a missing file yields the defaults
    pub async fn load(path: &Path) -> Result<Self, ConsoleError> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&contents).map_err(|e| {
            ConsoleError::ConfigError(format!("{}: {}", path.display(), e))
        })
    }

    /// Command line overrides
    pub fn apply_args(&mut self, args: &CliArgs) -> Result<(), ConsoleError> {
        if let Some(url) = args.get("url") {
            self.backend.base_url = url.to_string();
        }
        if let Some(interval) = args.parsed::<u64>("interval")? {
            self.poll_interval_secs = interval;
        }
        if let Some(level) = args.get("log-level") {
            self.log_level = level.parse().map_err(ConsoleError::ConfigError)?;
        }
        if args.flag("json-logs") {
            self.json_logs = true;
        }
        if self.poll_interval_secs == 0 {
            return Err(ConsoleError::ConfigError(
                "poll interval must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            log_level: self.log_level.clone(),
            json_format: self.json_logs,
            log_dir: self.log_dir.clone(),
            ..Default::default()
        }
    }

    pub fn app_options(&self) -> AppOptions {
        AppOptions {
            backend_base_url: self.backend.base_url.clone(),
            request_timeout: Duration::from_secs(self.backend.request_timeout_secs),
            poller: poller::Options {
                interval: Duration::from_secs(self.poll_interval_secs),
            },
            streams: streams::Options {
                update_buffer: self.log_stream_buffer,
            },
            ..Default::default()
        }
    }
}
