//! Live log streaming, one independent session per deployment

pub mod multiplexer;
pub mod session;

pub use multiplexer::{LogMultiplexer, Options};
pub use session::{CloseReason, SessionState, SessionToken, SessionUpdate, SessionView};
