//! Per-deployment log session state

use std::fmt;

/// Identity of one open-to-close lifecycle of a log subscription.
///
/// Tokens are never reused, so an event tagged with an old token can be told
/// apart from one belonging to a session reopened for the same deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(pub(crate) u64);

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No subscription held
    Closed,

    /// A subscription is live and appending to the buffer
    Open,

    /// The remote signalled the end of the stream
    Completed,
}

/// Why a session left `Open` without completing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Toggled off by the operator
    Manual,

    /// The transport failed to open or broke mid-stream
    TransportError,

    /// The remote ended the body without a completion event
    EndOfStream,
}

/// Read-only copy of a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub deployment_id: String,
    pub token: SessionToken,
    pub state: SessionState,
    pub lines: Vec<String>,
    pub final_status: Option<String>,
}

/// Change notifications for presentation
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Opened {
        deployment_id: String,
        token: SessionToken,
    },
    Line {
        deployment_id: String,
        token: SessionToken,
        line: String,
    },
    Completed {
        deployment_id: String,
        token: SessionToken,
        status: Option<String>,
    },
    Closed {
        deployment_id: String,
        token: SessionToken,
        reason: CloseReason,
    },
}

impl SessionUpdate {
    pub fn deployment_id(&self) -> &str {
        match self {
            SessionUpdate::Opened { deployment_id, .. }
            | SessionUpdate::Line { deployment_id, .. }
            | SessionUpdate::Completed { deployment_id, .. }
            | SessionUpdate::Closed { deployment_id, .. } => deployment_id,
        }
    }

    pub fn token(&self) -> SessionToken {
        match self {
            SessionUpdate::Opened { token, .. }
            | SessionUpdate::Line { token, .. }
            | SessionUpdate::Completed { token, .. }
            | SessionUpdate::Closed { token, .. } => *token,
        }
    }

    /// True if the session this update belongs to will emit nothing more
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionUpdate::Completed { .. } | SessionUpdate::Closed { .. }
        )
    }
}
