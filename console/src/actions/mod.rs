//! Operator actions

pub mod dispatcher;
pub mod launch;

pub use dispatcher::ActionDispatcher;
pub use launch::LaunchForm;
