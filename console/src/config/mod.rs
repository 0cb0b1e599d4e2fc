//! Configuration: settings file and command line

pub mod args;
pub mod settings;
