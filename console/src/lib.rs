//! Fleet Console Library
//!
//! Terminal console for a cluster orchestrator: watches deployments, runs
//! lifecycle actions against them and follows their logs.

pub mod actions;
pub mod app;
pub mod config;
pub mod errors;
pub mod http;
pub mod logs;
pub mod models;
pub mod remote;
pub mod streams;
pub mod sync;
pub mod ui;
pub mod utils;
pub mod workers;
