//! Log stream multiplexer

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::StreamExt;
use openapi_client::models::StreamMessage;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::remote::LogTransport;
use crate::streams::session::{
    CloseReason, SessionState, SessionToken, SessionUpdate, SessionView,
};

/// Multiplexer options
#[derive(Debug, Clone)]
pub struct Options {
    /// Capacity of the update broadcast channel
    pub update_buffer: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self { update_buffer: 256 }
    }
}

struct Slot {
    token: SessionToken,
    state: SessionState,
    lines: Vec<String>,
    final_status: Option<String>,
    pump: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct Sessions {
    next_token: u64,
    by_id: HashMap<String, Slot>,
}

struct Shared {
    sessions: Mutex<Sessions>,
    updates: broadcast::Sender<SessionUpdate>,
}

/// What the pump should do after handing over a message
#[derive(Debug, PartialEq, Eq)]
enum Delivery {
    Continue,
    Stop,
}

impl Shared {
    fn sessions(&self) -> MutexGuard<'_, Sessions> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, update: SessionUpdate) {
        // No receivers is fine
        let _ = self.updates.send(update);
    }

    /// Apply one message for session `token`. Messages for a session that is
    /// no longer the open one for `deployment_id` are dropped.
    fn deliver(&self, deployment_id: &str, token: SessionToken, message: StreamMessage) -> Delivery {
        let mut sessions = self.sessions();
        let Some(slot) = sessions.by_id.get_mut(deployment_id) else {
            return Delivery::Stop;
        };
        if slot.token != token || slot.state != SessionState::Open {
            debug!("Dropping event for stale log session {} of {}", token, deployment_id);
            return Delivery::Stop;
        }

        match message {
            StreamMessage::Log { message } => {
                slot.lines.push(message.clone());
                drop(sessions);
                self.publish(SessionUpdate::Line {
                    deployment_id: deployment_id.to_string(),
                    token,
                    line: message,
                });
                Delivery::Continue
            }
            StreamMessage::Complete { status } => {
                slot.state = SessionState::Completed;
                slot.final_status = status.clone();
                // The pump is the caller and exits right after this
                slot.pump = None;
                drop(sessions);
                info!("Log stream for {} completed", deployment_id);
                self.publish(SessionUpdate::Completed {
                    deployment_id: deployment_id.to_string(),
                    token,
                    status,
                });
                Delivery::Stop
            }
            StreamMessage::Unknown => {
                debug!("Ignoring unrecognized log event for {}", deployment_id);
                Delivery::Continue
            }
        }
    }

    /// Move session `token` to `Closed` from inside its own pump
    fn abandon(&self, deployment_id: &str, token: SessionToken, reason: CloseReason) {
        let mut sessions = self.sessions();
        let Some(slot) = sessions.by_id.get_mut(deployment_id) else {
            return;
        };
        if slot.token != token || slot.state != SessionState::Open {
            return;
        }
        slot.state = SessionState::Closed;
        slot.pump = None;
        drop(sessions);

        self.publish(SessionUpdate::Closed {
            deployment_id: deployment_id.to_string(),
            token,
            reason,
        });
    }
}

/// Owns at most one live log subscription per deployment.
///
/// Each open session runs a pump task that owns the transport subscription;
/// the subscription is dropped, and so released, on every way out of `Open`:
/// manual toggle-off (the pump is aborted and joined), completion, and
/// transport error (the pump returns). Sessions for different deployments
/// share nothing but the lock around the session map.
pub struct LogMultiplexer<T: LogTransport + ?Sized + 'static> {
    transport: Arc<T>,
    shared: Arc<Shared>,
}

impl<T: LogTransport + ?Sized + 'static> LogMultiplexer<T> {
    pub fn new(transport: Arc<T>, options: Options) -> Self {
        let (updates, _rx) = broadcast::channel(options.update_buffer.max(1));
        Self {
            transport,
            shared: Arc::new(Shared {
                sessions: Mutex::new(Sessions::default()),
                updates,
            }),
        }
    }

    /// Open a session if none is open for `deployment_id`, otherwise close it.
    /// Returns the resulting state.
    pub async fn toggle(&self, deployment_id: &str) -> SessionState {
        let closing = {
            let mut sessions = self.shared.sessions();
            let closing = match sessions.by_id.get_mut(deployment_id) {
                Some(slot) if slot.state == SessionState::Open => {
                    slot.state = SessionState::Closed;
                    Some((slot.token, slot.pump.take()))
                }
                _ => None,
            };
            if closing.is_none() {
                self.open_locked(&mut sessions, deployment_id);
            }
            closing
        };

        match closing {
            Some((token, pump)) => {
                if let Some(pump) = pump {
                    pump.abort();
                    // Joining guarantees the subscription is gone on return
                    let _ = pump.await;
                }
                info!("Log stream for {} closed", deployment_id);
                self.shared.publish(SessionUpdate::Closed {
                    deployment_id: deployment_id.to_string(),
                    token,
                    reason: CloseReason::Manual,
                });
                SessionState::Closed
            }
            None => SessionState::Open,
        }
    }

    /// Open (or reopen) a session unless one is already open.
    /// Returns the session token.
    pub fn open(&self, deployment_id: &str) -> SessionToken {
        let mut sessions = self.shared.sessions();
        if let Some(slot) = sessions.by_id.get(deployment_id) {
            if slot.state == SessionState::Open {
                return slot.token;
            }
        }
        self.open_locked(&mut sessions, deployment_id)
    }

    /// Close the session for `deployment_id` if it is open
    pub async fn close(&self, deployment_id: &str) -> SessionState {
        if self.state(deployment_id) == SessionState::Open {
            self.toggle(deployment_id).await
        } else {
            self.state(deployment_id)
        }
    }

    fn open_locked(&self, sessions: &mut Sessions, deployment_id: &str) -> SessionToken {
        sessions.next_token += 1;
        let token = SessionToken(sessions.next_token);

        let pump = tokio::spawn(pump(
            self.shared.clone(),
            self.transport.clone(),
            deployment_id.to_string(),
            token,
        ));

        let slot = sessions
            .by_id
            .entry(deployment_id.to_string())
            .or_insert_with(|| Slot {
                token,
                state: SessionState::Closed,
                lines: Vec::new(),
                final_status: None,
                pump: None,
            });
        slot.token = token;
        slot.state = SessionState::Open;
        slot.lines.clear();
        slot.final_status = None;
        slot.pump = Some(pump);

        info!("Log stream for {} opened (session {})", deployment_id, token);
        self.shared.publish(SessionUpdate::Opened {
            deployment_id: deployment_id.to_string(),
            token,
        });
        token
    }

    pub fn state(&self, deployment_id: &str) -> SessionState {
        self.shared
            .sessions()
            .by_id
            .get(deployment_id)
            .map(|slot| slot.state)
            .unwrap_or(SessionState::Closed)
    }

    /// Buffered lines of the current or last session
    pub fn lines(&self, deployment_id: &str) -> Vec<String> {
        self.shared
            .sessions()
            .by_id
            .get(deployment_id)
            .map(|slot| slot.lines.clone())
            .unwrap_or_default()
    }

    pub fn session(&self, deployment_id: &str) -> Option<SessionView> {
        self.shared
            .sessions()
            .by_id
            .get(deployment_id)
            .map(|slot| SessionView {
                deployment_id: deployment_id.to_string(),
                token: slot.token,
                state: slot.state,
                lines: slot.lines.clone(),
                final_status: slot.final_status.clone(),
            })
    }

    /// Number of sessions currently `Open`
    pub fn open_count(&self) -> usize {
        self.shared
            .sessions()
            .by_id
            .values()
            .filter(|slot| slot.state == SessionState::Open)
            .count()
    }

    pub fn subscribe_updates(&self) -> broadcast::Receiver<SessionUpdate> {
        self.shared.updates.subscribe()
    }

    /// Close every open session
    pub async fn shutdown(&self) {
        let open: Vec<String> = self
            .shared
            .sessions()
            .by_id
            .iter()
            .filter(|(_, slot)| slot.state == SessionState::Open)
            .map(|(id, _)| id.clone())
            .collect();

        for deployment_id in open {
            self.close(&deployment_id).await;
        }
    }
}

impl<T: LogTransport + ?Sized + 'static> Drop for LogMultiplexer<T> {
    fn drop(&mut self) {
        let mut sessions = self.shared.sessions();
        for slot in sessions.by_id.values_mut() {
            if let Some(pump) = slot.pump.take() {
                pump.abort();
            }
            if slot.state == SessionState::Open {
                slot.state = SessionState::Closed;
            }
        }
    }
}

async fn pump<T: LogTransport + ?Sized>(
    shared: Arc<Shared>,
    transport: Arc<T>,
    deployment_id: String,
    token: SessionToken,
) {
    let mut subscription = match transport.subscribe(&deployment_id).await {
        Ok(subscription) => subscription,
        Err(e) => {
            warn!("Failed to open log stream for {}: {}", deployment_id, e);
            shared.abandon(&deployment_id, token, CloseReason::TransportError);
            return;
        }
    };
    debug!("Log subscription {} for {} established", token, deployment_id);

    while let Some(item) = subscription.next().await {
        match item {
            Ok(message) => {
                if shared.deliver(&deployment_id, token, message) == Delivery::Stop {
                    return;
                }
            }
            Err(e) => {
                warn!("Log stream for {} failed: {}", deployment_id, e);
                shared.abandon(&deployment_id, token, CloseReason::TransportError);
                return;
            }
        }
    }

    debug!("Log stream for {} ended without completion", deployment_id);
    shared.abandon(&deployment_id, token, CloseReason::EndOfStream);
}
