//! Application configuration options

use std::time::Duration;

use crate::streams;
use crate::workers::poller;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Orchestrator API base URL
    pub backend_base_url: String,

    /// Per-request timeout for non-streaming calls
    pub request_timeout: Duration,

    /// Poller worker options
    pub poller: poller::Options,

    /// Log stream options
    pub streams: streams::Options,

    /// Watch mode presentation
    pub watch: WatchOptions,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            backend_base_url: "http://localhost:5001/api".to_string(),
            request_timeout: Duration::from_secs(30),
            poller: poller::Options::default(),
            streams: streams::Options::default(),
            watch: WatchOptions::default(),
        }
    }
}

/// Lifecycle options for the console
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(5),
        }
    }
}

/// Watch mode options
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Colorize statuses
    pub color: bool,

    /// Clear the terminal before each redraw
    pub clear_screen: bool,

    /// Lines of each open log session shown under the table
    pub log_tail: usize,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            color: true,
            clear_screen: true,
            log_tail: 20,
        }
    }
}
