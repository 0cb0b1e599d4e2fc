//! Long-running console modes

use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::app::options::{AppOptions, LifecycleOptions, WatchOptions};
use crate::app::state::AppState;
use crate::errors::ConsoleError;
use crate::streams::{CloseReason, SessionUpdate};
use crate::ui::{logs, table};

/// Watch the deployment table until `shutdown_signal` fires, optionally
/// following one deployment's logs underneath it
pub async fn watch(
    state: Arc<AppState>,
    options: &AppOptions,
    follow: Option<String>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ConsoleError> {
    info!("Watching deployments at {}", options.backend_base_url);
    let mut shutdown_manager = ShutdownManager::new(options.lifecycle.clone(), state.clone());

    let result = watch_impl(&state, &options.watch, follow.as_deref(), shutdown_signal).await;
    if let Err(e) = &result {
        error!("Watch loop failed: {}", e);
    }

    shutdown_manager.shutdown().await?;
    result
}

async fn watch_impl(
    state: &AppState,
    options: &WatchOptions,
    follow: Option<&str>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ConsoleError> {
    let mut snapshots = state.store.subscribe();
    let mut updates = state.logs.subscribe_updates();

    state.scheduler.start();
    if let Some(deployment_id) = follow {
        state.logs.open(deployment_id);
    }

    let mut stdout = std::io::stdout();
    draw(&mut stdout, &compose_screen(state, options, follow))?;

    tokio::pin!(shutdown_signal);
    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Shutdown signal received, shutting down...");
                return Ok(());
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
            }
            update = updates.recv() => match update {
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("Redraw lagged {} log updates behind", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(()),
            }
        }

        draw(&mut stdout, &compose_screen(state, options, follow))?;
    }
}

/// One full frame of watch mode
pub fn compose_screen(state: &AppState, options: &WatchOptions, follow: Option<&str>) -> String {
    let mut screen = String::new();
    if options.clear_screen {
        screen.push_str("\x1b[2J\x1b[H");
    }

    screen.push_str(&table::render(&state.store.snapshot(), options.color));

    let sync = state.syncer.get_state();
    match (&sync.last_error, sync.last_synced_at) {
        (Some(e), _) if sync.err_streak > 0 => {
            screen.push_str(&format!(
                "\nrefresh failed ({} in a row): {}\n",
                sync.err_streak, e
            ));
        }
        (_, Some(at)) => {
            screen.push_str(&format!("\nupdated {}\n", at.format("%H:%M:%S")));
        }
        _ => {}
    }

    if let Some(view) = follow.and_then(|id| state.logs.session(id)) {
        screen.push('\n');
        screen.push_str(&logs::render_session(&view, options.log_tail));
    }
    screen
}

fn draw(out: &mut impl Write, screen: &str) -> Result<(), ConsoleError> {
    out.write_all(screen.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Print one deployment's log lines until the stream completes, fails, or
/// `shutdown_signal` fires. Returns the completion status, if any.
pub async fn tail(
    state: Arc<AppState>,
    options: &AppOptions,
    deployment_id: &str,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<Option<String>, ConsoleError> {
    let mut shutdown_manager = ShutdownManager::new(options.lifecycle.clone(), state.clone());
    let mut stdout = std::io::stdout();

    let result = tail_impl(&state, deployment_id, &mut stdout, shutdown_signal).await;
    shutdown_manager.shutdown().await?;
    result
}

async fn tail_impl(
    state: &AppState,
    deployment_id: &str,
    out: &mut impl Write,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<Option<String>, ConsoleError> {
    // Subscribe before opening so the first lines are not missed
    let mut updates = state.logs.subscribe_updates();
    let token = state.logs.open(deployment_id);

    tokio::pin!(shutdown_signal);
    loop {
        let update = tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Shutdown signal received, closing log stream...");
                state.logs.close(deployment_id).await;
                return Ok(None);
            }
            update = updates.recv() => update,
        };

        let update = match update {
            Ok(update) if update.token() == token && update.deployment_id() == deployment_id => {
                update
            }
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Output fell behind, {} log update(s) skipped", skipped);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return Ok(None),
        };

        match update {
            SessionUpdate::Opened { .. } => {}
            SessionUpdate::Line { line, .. } => {
                writeln!(out, "{}", line)?;
                out.flush()?;
            }
            SessionUpdate::Completed { status, .. } => {
                info!(
                    "Log stream for {} completed with status {}",
                    deployment_id,
                    status.as_deref().unwrap_or("unknown")
                );
                return Ok(status);
            }
            SessionUpdate::Closed { reason, .. } => {
                return match reason {
                    CloseReason::Manual => Ok(None),
                    CloseReason::TransportError => Err(ConsoleError::StreamError(format!(
                        "log stream for {} failed",
                        deployment_id
                    ))),
                    CloseReason::EndOfStream => Err(ConsoleError::StreamError(format!(
                        "log stream for {} ended without completing",
                        deployment_id
                    ))),
                };
            }
        }
    }
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    lifecycle_options: LifecycleOptions,
    app_state: Option<Arc<AppState>>,
}

impl ShutdownManager {
    fn new(lifecycle_options: LifecycleOptions, app_state: Arc<AppState>) -> Self {
        Self {
            lifecycle_options,
            app_state: Some(app_state),
        }
    }

    async fn shutdown(&mut self) -> Result<(), ConsoleError> {
        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(()) => Ok(()),
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}",
                    self.lifecycle_options.max_shutdown_delay
                );
                Err(ConsoleError::ShutdownError(format!(
                    "timed out after {:?}",
                    self.lifecycle_options.max_shutdown_delay
                )))
            }
        }
    }

    async fn shutdown_impl(&mut self) {
        if let Some(app_state) = self.app_state.take() {
            app_state.shutdown().await;
        }
        info!("Shutdown complete");
    }
}
