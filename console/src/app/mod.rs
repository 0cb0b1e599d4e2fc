//! Application wiring and run modes

pub mod commands;
pub mod options;
pub mod run;
pub mod state;
